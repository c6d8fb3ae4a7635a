use serde::{Deserialize, Serialize};

/// One kernel launch inside a solution: what to compile and how to launch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelInfo {
    pub kernel_name: String,
    pub build_options: String,
    pub global_work: [usize; 3],
    pub local_work: [usize; 3],
}

impl KernelInfo {
    pub fn new(kernel_name: &str) -> Self {
        Self {
            kernel_name: kernel_name.to_string(),
            build_options: String::new(),
            global_work: [1, 1, 1],
            local_work: [1, 1, 1],
        }
    }

    pub fn with_build_options(mut self, options: String) -> Self {
        self.build_options = options;
        self
    }

    pub fn with_work(mut self, global: [usize; 3], local: [usize; 3]) -> Self {
        self.global_work = global;
        self.local_work = local;
        self
    }
}

/// A fully-determined way to run one convolution problem: the kernels to
/// launch, the workspace they need, and the id of the solver that produced
/// it. Solutions are plain data; nothing here touches a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvSolution {
    pub solver_id: String,
    pub kernels: Vec<KernelInfo>,
    pub workspace_size: usize,
}

impl ConvSolution {
    pub fn new(kernel: KernelInfo) -> Self {
        Self {
            solver_id: String::new(),
            kernels: vec![kernel],
            workspace_size: 0,
        }
    }

    pub fn with_kernel(mut self, kernel: KernelInfo) -> Self {
        self.kernels.push(kernel);
        self
    }

    pub fn with_workspace(mut self, bytes: usize) -> Self {
        self.workspace_size = bytes;
        self
    }

    pub fn with_solver_id(mut self, id: &str) -> Self {
        self.solver_id = id.to_string();
        self
    }
}

/// Execution-side context threaded through `find_solution` untouched. The
/// selection engine never reads it; it exists so callers can hand launch
/// state to whatever runs the chosen solution.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvokeParams {
    pub workspace_bytes: usize,
}
