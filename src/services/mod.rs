//! Service layer: analysis simulation and report export.

pub mod analysis;
pub mod report;

pub use analysis::{AnalysisSimulator, Cancelled, Simulation, SimulationConfig, StageProgress};
pub use report::{AnalysisReport, ReportFormat};
