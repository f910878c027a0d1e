//! # ユースケース層
//!
//! 承認ワークフローエンジンと権限解決を実装する。

mod absence;
mod authorization;

pub use absence::{
    AbsenceUseCaseImpl, AbsenceWorkflowDeps, CancellationPolicy, CreateAbsenceInput,
    UpdateStatusInput,
};
