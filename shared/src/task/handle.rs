use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct CreateTaskDescriptor {
    pub project: u64,
    pub name: String,
    pub description: String,
    pub kind: super::TaskKind,
    pub volunteers_needed: u32,
    pub expenses: Option<super::ExpenseRequirement>,
}

#[derive(Serialize, Deserialize)]
pub struct GetTasksDescriptor {
    pub project: u64,
}

#[derive(Serialize, Deserialize)]
pub struct AssignTaskDescriptor {
    pub task: u64,
    /// The volunteer must hold an approved application
    /// for the task's project.
    pub volunteer: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ApplyDescriptor {
    pub project: u64,
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct GetApplicationsDescriptor {
    pub project: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ReviewApplicationDescriptor {
    pub application: u64,
    pub variant: ReviewApplicationVariant,
}

#[derive(Serialize, Deserialize, Clone, Copy)]
pub enum ReviewApplicationVariant {
    Approve,
    Reject,
}

#[derive(Serialize, Deserialize)]
pub struct SubmitReportDescriptor {
    pub task: u64,
    pub summary: String,
    pub expense_amount: Option<u64>,
    pub expense_purpose: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct GetReportsDescriptor {
    pub project: u64,
}
