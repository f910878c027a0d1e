//! # API ハンドラ
//!
//! Absence Service のエンドポイントを実装する。

mod absence;
mod health;

pub use absence::{
    AbsenceState, create_absence, get_absence, list_absences_by_subject, update_absence_status,
};
pub use health::health_check;
