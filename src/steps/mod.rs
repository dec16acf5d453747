pub mod data;
pub mod step;

pub use data::{MazeTrace, StepsData};
pub use step::{CellEffect, CellRole, Pos, Step, StepType, VisitAction, class_for_code};
