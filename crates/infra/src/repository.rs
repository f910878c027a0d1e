//! # リポジトリ
//!
//! 永続化操作のトレイト定義と PostgreSQL 実装を提供する。
//!
//! ユースケース層はトレイトにのみ依存し、テストでは
//! `mock` モジュールのインメモリ実装に差し替える。

pub mod absence_request_repository;
pub mod audit_log_repository;
pub mod employee_repository;
pub mod role_repository;

pub use absence_request_repository::{AbsenceRequestRepository, PostgresAbsenceRequestRepository};
pub use audit_log_repository::{AuditLogRepository, PostgresAuditLogRepository};
pub use employee_repository::{EmployeeRepository, PostgresEmployeeRepository};
pub use role_repository::{PostgresRoleRepository, RoleRepository};
