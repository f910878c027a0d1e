//! # 不在申請エンティティ
//!
//! 2段階承認（一次 = N+1 上長、二次 = 人事）の状態機械を持つ不在申請を管理する。
//!
//! 状態遷移は ADT（代数的データ型）で表現し、不正な状態を型レベルで防止する。
//! 各ステータスが要求する承認記録（validator + タイムスタンプ）は
//! 対応する状態バリアントのみが保持するため、「二次承認済みなのに
//! 一次承認記録がない」といった行は構築できない。
//!
//! 計画影響フラグ（`scheduling_impact`）は派生値であり、遷移のたびに
//! 再計算される。呼び出し側が更新時に直接設定することはできない。
//! 唯一の例外は人事による代理作成時の明示的な無効化指定。

use chrono::{DateTime, Utc};
use strum::IntoStaticStr;

use super::{AbsenceKind, Period};
use crate::{DomainError, employee::EmployeeId, user::UserId};

define_uuid_id! {
    /// 不在申請 ID
    pub struct AbsenceRequestId;
}

/// 不在申請ステータス
///
/// 終了状態は `Level1Rejected` / `Level2Rejected` / `Cancelled` の 3 つで、
/// そこからの遷移はすべて拒否される。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AbsenceStatus {
    /// 一次承認待ち（N+1 上長）
    PendingLevel1,
    /// 一次承認済み（通常は直ちに二次承認待ちへ進む中間状態）
    Level1Approved,
    /// 一次却下（終了状態）
    Level1Rejected,
    /// 二次承認待ち（人事）
    PendingLevel2,
    /// 二次承認済み（計画に対して確定）
    Level2Approved,
    /// 二次却下（終了状態）
    Level2Rejected,
    /// 適用済み（運用上実施中）
    Applied,
    /// 取消（終了状態）
    Cancelled,
}

impl AbsenceStatus {
    /// 終了状態（以後の遷移が許されない）かどうか
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Level1Rejected | Self::Level2Rejected | Self::Cancelled
        )
    }

    /// このステータスが計画影響（scheduling impact）を持つかどうか
    ///
    /// 二次承認済みまたは適用済みの申請のみが計画系にとって確定である。
    pub fn grants_scheduling_impact(&self) -> bool {
        matches!(self, Self::Level2Approved | Self::Applied)
    }
}

impl std::str::FromStr for AbsenceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_level1" => Ok(Self::PendingLevel1),
            "level1_approved" => Ok(Self::Level1Approved),
            "level1_rejected" => Ok(Self::Level1Rejected),
            "pending_level2" => Ok(Self::PendingLevel2),
            "level2_approved" => Ok(Self::Level2Approved),
            "level2_rejected" => Ok(Self::Level2Rejected),
            "applied" => Ok(Self::Applied),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::Validation(format!(
                "不正な不在申請ステータス: {}",
                s
            ))),
        }
    }
}

/// 承認・却下の決裁記録
///
/// 誰がいつその段階を決裁したかを保持する。却下も決裁の一種として記録する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRecord {
    /// 決裁者のユーザー ID
    pub validated_by: UserId,
    /// 決裁日時
    pub validated_at: DateTime<Utc>,
}

impl ValidationRecord {
    pub fn new(validated_by: UserId, validated_at: DateTime<Utc>) -> Self {
        Self {
            validated_by,
            validated_at,
        }
    }
}

/// 一次決裁済み状態の固有フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level1Decided {
    /// 一次決裁記録
    pub level1: ValidationRecord,
}

/// 一次・二次とも決裁済み状態の固有フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullyDecided {
    /// 一次決裁記録
    pub level1: ValidationRecord,
    /// 二次決裁記録
    pub level2: ValidationRecord,
}

/// 取消状態の固有フィールド
///
/// どの段階からでも取消可能なため、決裁記録は前状態に依存して
/// Option で表現する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelledState {
    /// 一次決裁記録（取消時点で決裁済みだった場合のみ）
    pub level1:       Option<ValidationRecord>,
    /// 二次決裁記録（取消時点で決裁済みだった場合のみ）
    pub level2:       Option<ValidationRecord>,
    /// 取消日時
    pub cancelled_at: DateTime<Utc>,
}

/// 不在申請の状態（ADT ベースステートマシン）
///
/// 各状態で有効な決裁記録のみを持たせることで、不正な組み合わせを
/// 型レベルで防止する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsenceRequestState {
    /// 一次承認待ち
    PendingLevel1,
    /// 一次承認済み（DB 上に残っている場合の整合用。通常の承認は
    /// 直接 PendingLevel2 へ進む）
    Level1Approved(Level1Decided),
    /// 一次却下（終了状態）
    Level1Rejected(Level1Decided),
    /// 二次承認待ち
    PendingLevel2(Level1Decided),
    /// 二次承認済み
    Level2Approved(FullyDecided),
    /// 二次却下（終了状態）
    Level2Rejected(FullyDecided),
    /// 適用済み
    Applied(FullyDecided),
    /// 取消（終了状態）
    Cancelled(CancelledState),
}

/// 不在申請エンティティ
///
/// 共通フィールドを外側に、状態固有の決裁記録を `state` enum に分離する。
/// `subject_id`（対象従業員）は作成後不変。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsenceRequest {
    id: AbsenceRequestId,
    subject_id: EmployeeId,
    kind: AbsenceKind,
    period: Period,
    comment: Option<String>,
    scheduling_impact: bool,
    created_by: UserId,
    updated_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    state: AbsenceRequestState,
}

/// 不在申請の新規作成パラメータ
pub struct NewAbsenceRequest {
    pub id: AbsenceRequestId,
    pub subject_id: EmployeeId,
    pub kind: AbsenceKind,
    pub period: Period,
    pub comment: Option<String>,
    pub created_by: UserId,
    pub now: DateTime<Utc>,
}

/// 不在申請の DB 復元パラメータ
///
/// DB スキーマのフラット構造を表現する。`from_db()` で不変条件を検証して
/// ADT に変換する。
pub struct AbsenceRequestRecord {
    pub id: AbsenceRequestId,
    pub subject_id: EmployeeId,
    pub kind: AbsenceKind,
    pub period: Period,
    pub comment: Option<String>,
    pub status: AbsenceStatus,
    pub scheduling_impact: bool,
    pub level1_validated_by: Option<UserId>,
    pub level1_validated_at: Option<DateTime<Utc>>,
    pub level2_validated_by: Option<UserId>,
    pub level2_validated_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub updated_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AbsenceRequest {
    /// 新しい不在申請を一次承認待ちとして作成する
    pub fn new(params: NewAbsenceRequest) -> Self {
        Self {
            id: params.id,
            subject_id: params.subject_id,
            kind: params.kind,
            period: params.period,
            comment: params.comment,
            scheduling_impact: false,
            created_by: params.created_by.clone(),
            updated_by: params.created_by,
            created_at: params.now,
            updated_at: params.now,
            state: AbsenceRequestState::PendingLevel1,
        }
    }

    /// 一次承認済みの不在申請を作成する（上長による代理作成ショートカット）
    ///
    /// アカウントを持たない従業員の代わりに上長が登録する場合、
    /// 上長自身が一次決裁を済ませたものとして扱い、
    /// 直接二次承認待ちから開始する。
    /// 一次決裁記録には作成者と作成日時が記録される。
    pub fn new_level1_validated(params: NewAbsenceRequest) -> Self {
        let level1 = ValidationRecord::new(params.created_by.clone(), params.now);
        Self {
            id: params.id,
            subject_id: params.subject_id,
            kind: params.kind,
            period: params.period,
            comment: params.comment,
            scheduling_impact: false,
            created_by: params.created_by.clone(),
            updated_by: params.created_by,
            created_at: params.now,
            updated_at: params.now,
            state: AbsenceRequestState::PendingLevel2(Level1Decided { level1 }),
        }
    }

    /// 二次承認済みの不在申請を作成する（人事による代理作成ショートカット）
    ///
    /// 人事・管理者が第三者の不在を登録する場合、両段階の委任権限を
    /// 既に持つものとして扱い、作成時点で確定状態にする。
    /// 両決裁記録に作成者と作成日時が記録される。
    ///
    /// `scheduling_impact` は通常 `true` だが、呼び出し側が明示的に
    /// `false` を指定した場合のみそれを尊重する（作成時限定の上書き）。
    pub fn new_fully_validated(params: NewAbsenceRequest, scheduling_impact: bool) -> Self {
        let level1 = ValidationRecord::new(params.created_by.clone(), params.now);
        let level2 = ValidationRecord::new(params.created_by.clone(), params.now);
        Self {
            id: params.id,
            subject_id: params.subject_id,
            kind: params.kind,
            period: params.period,
            comment: params.comment,
            scheduling_impact,
            created_by: params.created_by.clone(),
            updated_by: params.created_by,
            created_at: params.now,
            updated_at: params.now,
            state: AbsenceRequestState::Level2Approved(FullyDecided { level1, level2 }),
        }
    }

    /// 既存のデータから復元する
    ///
    /// DB のフラット構造から ADT に変換し、ステータスが要求する
    /// 決裁記録の存在を検証する。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 不変条件違反（例: PendingLevel2 で一次決裁記録が欠損）
    pub fn from_db(record: AbsenceRequestRecord) -> Result<Self, DomainError> {
        let level1 = Self::validation_pair(
            record.level1_validated_by.clone(),
            record.level1_validated_at,
        );
        let level2 = Self::validation_pair(
            record.level2_validated_by.clone(),
            record.level2_validated_at,
        );

        let require_level1 = |level1: Option<ValidationRecord>| {
            level1.ok_or_else(|| {
                DomainError::Validation(format!(
                    "{} の申請には一次決裁記録が必要です",
                    record.status
                ))
            })
        };
        let require_level2 = |level2: Option<ValidationRecord>| {
            level2.ok_or_else(|| {
                DomainError::Validation(format!(
                    "{} の申請には二次決裁記録が必要です",
                    record.status
                ))
            })
        };

        let state = match record.status {
            AbsenceStatus::PendingLevel1 => AbsenceRequestState::PendingLevel1,
            AbsenceStatus::Level1Approved => AbsenceRequestState::Level1Approved(Level1Decided {
                level1: require_level1(level1)?,
            }),
            AbsenceStatus::Level1Rejected => AbsenceRequestState::Level1Rejected(Level1Decided {
                level1: require_level1(level1)?,
            }),
            AbsenceStatus::PendingLevel2 => AbsenceRequestState::PendingLevel2(Level1Decided {
                level1: require_level1(level1)?,
            }),
            AbsenceStatus::Level2Approved => AbsenceRequestState::Level2Approved(FullyDecided {
                level1: require_level1(level1)?,
                level2: require_level2(level2)?,
            }),
            AbsenceStatus::Level2Rejected => AbsenceRequestState::Level2Rejected(FullyDecided {
                level1: require_level1(level1)?,
                level2: require_level2(level2)?,
            }),
            AbsenceStatus::Applied => AbsenceRequestState::Applied(FullyDecided {
                level1: require_level1(level1)?,
                level2: require_level2(level2)?,
            }),
            AbsenceStatus::Cancelled => {
                let cancelled_at = record.cancelled_at.ok_or_else(|| {
                    DomainError::Validation(
                        "cancelled の申請には cancelled_at が必要です".to_string(),
                    )
                })?;
                AbsenceRequestState::Cancelled(CancelledState {
                    level1,
                    level2,
                    cancelled_at,
                })
            }
        };

        Ok(Self {
            id: record.id,
            subject_id: record.subject_id,
            kind: record.kind,
            period: record.period,
            comment: record.comment,
            scheduling_impact: record.scheduling_impact,
            created_by: record.created_by,
            updated_by: record.updated_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
            state,
        })
    }

    fn validation_pair(
        validated_by: Option<UserId>,
        validated_at: Option<DateTime<Utc>>,
    ) -> Option<ValidationRecord> {
        match (validated_by, validated_at) {
            (Some(validated_by), Some(validated_at)) => Some(ValidationRecord {
                validated_by,
                validated_at,
            }),
            _ => None,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &AbsenceRequestId {
        &self.id
    }

    pub fn subject_id(&self) -> &EmployeeId {
        &self.subject_id
    }

    pub fn kind(&self) -> AbsenceKind {
        self.kind
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// 計画影響フラグ（計画系コラボレータが参照する派生値）
    pub fn scheduling_impact(&self) -> bool {
        self.scheduling_impact
    }

    pub fn status(&self) -> AbsenceStatus {
        match &self.state {
            AbsenceRequestState::PendingLevel1 => AbsenceStatus::PendingLevel1,
            AbsenceRequestState::Level1Approved(_) => AbsenceStatus::Level1Approved,
            AbsenceRequestState::Level1Rejected(_) => AbsenceStatus::Level1Rejected,
            AbsenceRequestState::PendingLevel2(_) => AbsenceStatus::PendingLevel2,
            AbsenceRequestState::Level2Approved(_) => AbsenceStatus::Level2Approved,
            AbsenceRequestState::Level2Rejected(_) => AbsenceStatus::Level2Rejected,
            AbsenceRequestState::Applied(_) => AbsenceStatus::Applied,
            AbsenceRequestState::Cancelled(_) => AbsenceStatus::Cancelled,
        }
    }

    pub fn level1_validation(&self) -> Option<&ValidationRecord> {
        match &self.state {
            AbsenceRequestState::PendingLevel1 => None,
            AbsenceRequestState::Level1Approved(s)
            | AbsenceRequestState::Level1Rejected(s)
            | AbsenceRequestState::PendingLevel2(s) => Some(&s.level1),
            AbsenceRequestState::Level2Approved(s)
            | AbsenceRequestState::Level2Rejected(s)
            | AbsenceRequestState::Applied(s) => Some(&s.level1),
            AbsenceRequestState::Cancelled(s) => s.level1.as_ref(),
        }
    }

    pub fn level2_validation(&self) -> Option<&ValidationRecord> {
        match &self.state {
            AbsenceRequestState::Level2Approved(s)
            | AbsenceRequestState::Level2Rejected(s)
            | AbsenceRequestState::Applied(s) => Some(&s.level2),
            AbsenceRequestState::Cancelled(s) => s.level2.as_ref(),
            _ => None,
        }
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            AbsenceRequestState::Cancelled(s) => Some(s.cancelled_at),
            _ => None,
        }
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn updated_by(&self) -> &UserId {
        &self.updated_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 状態への直接アクセス（パターンマッチ用）
    pub fn state(&self) -> &AbsenceRequestState {
        &self.state
    }

    // 状態遷移メソッド

    /// 一次承認した新しいインスタンスを返す
    ///
    /// 一次承認の帰結として自動的に二次承認待ちへ進むため、
    /// 結果のステータスは `PendingLevel2` になる。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition`: 一次承認待ち以外の状態で呼び出した場合
    pub fn approve_level1(
        self,
        validator: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        match self.state {
            AbsenceRequestState::PendingLevel1 => Ok(Self {
                state: AbsenceRequestState::PendingLevel2(Level1Decided {
                    level1: ValidationRecord::new(validator.clone(), now),
                }),
                scheduling_impact: AbsenceStatus::PendingLevel2.grants_scheduling_impact(),
                updated_by: validator,
                updated_at: now,
                ..self
            }),
            _ => Err(self.invalid_transition(AbsenceStatus::Level1Approved)),
        }
    }

    /// 一次却下した新しいインスタンスを返す（終了状態）
    ///
    /// 却下も決裁の一種として、決裁者とタイムスタンプを一次決裁記録に残す。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition`: 一次承認待ち以外の状態で呼び出した場合
    pub fn reject_level1(self, validator: UserId, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            AbsenceRequestState::PendingLevel1 => Ok(Self {
                state: AbsenceRequestState::Level1Rejected(Level1Decided {
                    level1: ValidationRecord::new(validator.clone(), now),
                }),
                scheduling_impact: false,
                updated_by: validator,
                updated_at: now,
                ..self
            }),
            _ => Err(self.invalid_transition(AbsenceStatus::Level1Rejected)),
        }
    }

    /// 一次承認済みのまま残っている申請を二次承認待ちへ進める
    ///
    /// 一次承認は通常 [`approve_level1`](Self::approve_level1) の帰結として
    /// 直接二次承認待ちになるが、`level1_approved` のまま永続化された行の
    /// 整合処理（バックグラウンド補正）のためにこの遷移を残している。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition`: 一次承認済み以外の状態で呼び出した場合
    pub fn advanced_to_level2(self, actor: UserId, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            AbsenceRequestState::Level1Approved(decided) => Ok(Self {
                state: AbsenceRequestState::PendingLevel2(decided),
                scheduling_impact: false,
                updated_by: actor,
                updated_at: now,
                ..self
            }),
            _ => Err(self.invalid_transition(AbsenceStatus::PendingLevel2)),
        }
    }

    /// 二次承認した新しいインスタンスを返す
    ///
    /// 二次承認により申請は計画に対して確定となり、
    /// `scheduling_impact` が真になる。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition`: 二次承認待ち以外の状態で呼び出した場合
    pub fn approve_level2(
        self,
        validator: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        match self.state {
            AbsenceRequestState::PendingLevel2(decided) => Ok(Self {
                state: AbsenceRequestState::Level2Approved(FullyDecided {
                    level1: decided.level1,
                    level2: ValidationRecord::new(validator.clone(), now),
                }),
                scheduling_impact: AbsenceStatus::Level2Approved.grants_scheduling_impact(),
                updated_by: validator,
                updated_at: now,
                ..self
            }),
            _ => Err(self.invalid_transition(AbsenceStatus::Level2Approved)),
        }
    }

    /// 二次却下した新しいインスタンスを返す（終了状態）
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition`: 二次承認待ち以外の状態で呼び出した場合
    pub fn reject_level2(self, validator: UserId, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            AbsenceRequestState::PendingLevel2(decided) => Ok(Self {
                state: AbsenceRequestState::Level2Rejected(FullyDecided {
                    level1: decided.level1,
                    level2: ValidationRecord::new(validator.clone(), now),
                }),
                scheduling_impact: false,
                updated_by: validator,
                updated_at: now,
                ..self
            }),
            _ => Err(self.invalid_transition(AbsenceStatus::Level2Rejected)),
        }
    }

    /// 適用済みにした新しいインスタンスを返す
    ///
    /// 不在が運用上実施中であることを示す。計画影響フラグは変更しない
    /// （二次承認時点の値を維持する）。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition`: 二次承認済み以外の状態で呼び出した場合
    pub fn applied(self, actor: UserId, now: DateTime<Utc>) -> Result<Self, DomainError> {
        match self.state {
            AbsenceRequestState::Level2Approved(decided) => Ok(Self {
                state: AbsenceRequestState::Applied(decided),
                updated_by: actor,
                updated_at: now,
                ..self
            }),
            _ => Err(self.invalid_transition(AbsenceStatus::Applied)),
        }
    }

    /// 取消した新しいインスタンスを返す（終了状態）
    ///
    /// 終了状態を除くすべての状態から遷移可能。
    /// 計画影響フラグは必ず偽になる。
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidTransition`: 終了状態で呼び出した場合
    pub fn cancelled(self, actor: UserId, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let (level1, level2) = match self.state {
            AbsenceRequestState::PendingLevel1 => (None, None),
            AbsenceRequestState::Level1Approved(decided)
            | AbsenceRequestState::PendingLevel2(decided) => (Some(decided.level1), None),
            AbsenceRequestState::Level2Approved(decided)
            | AbsenceRequestState::Applied(decided) => {
                (Some(decided.level1), Some(decided.level2))
            }
            AbsenceRequestState::Level1Rejected(_)
            | AbsenceRequestState::Level2Rejected(_)
            | AbsenceRequestState::Cancelled(_) => {
                return Err(self.invalid_transition(AbsenceStatus::Cancelled));
            }
        };

        Ok(Self {
            state: AbsenceRequestState::Cancelled(CancelledState {
                level1,
                level2,
                cancelled_at: now,
            }),
            scheduling_impact: false,
            updated_by: actor,
            updated_at: now,
            ..self
        })
    }

    /// コメントを差し替えた新しいインスタンスを返す
    ///
    /// ステータス更新に付随する補助編集用。状態遷移には関与しない。
    pub fn with_comment(self, comment: Option<String>) -> Self {
        Self { comment, ..self }
    }

    fn invalid_transition(&self, to: AbsenceStatus) -> DomainError {
        DomainError::InvalidTransition {
            from: self.status().into(),
            to:   to.into(),
        }
    }
}
