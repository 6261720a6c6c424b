mod execute;
mod plan;

pub use execute::{execute_plan, ExecutionReport, MoveOutcome, MoveStatus};
pub use plan::{OrganizationPlan, OrganizationPlanner, PlanAction, PlanEntry};
