// ============================================================
// Layer 5 — Demo Model Runner
// ============================================================
// Owns a small Mlp on the CPU backend and feeds it random
// batches. The application layer drives recordings through
// this type so it never has to name a burn backend itself.

use burn::{prelude::*, tensor::Distribution};

use crate::domain::traits::HostModule;
use crate::ml::model::{Mlp, MlpConfig};

pub type DemoBackend = burn::backend::NdArray;

pub struct DemoModel {
    model:      Mlp<DemoBackend>,
    device:     burn::backend::ndarray::NdArrayDevice,
    batch_size: usize,
    d_input:    usize,
}

impl DemoModel {
    pub fn new(config: &MlpConfig, batch_size: usize) -> Self {
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let model = config.init::<DemoBackend>(&device);
        Self { model, device, batch_size, d_input: config.d_input }
    }

    /// The root module, for handing to a Session.
    pub fn module(&self) -> &dyn HostModule {
        &self.model
    }

    /// One forward pass on a random [batch_size, d_input] batch.
    /// Returns the output dims.
    pub fn step(&self) -> Vec<usize> {
        let input = Tensor::<DemoBackend, 2>::random(
            [self.batch_size, self.d_input],
            Distribution::Default,
            &self.device,
        );
        self.model.forward(input).dims().to_vec()
    }
}
