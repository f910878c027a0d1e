//! # 不在期間（値オブジェクト）

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// 不在期間（値オブジェクト）
///
/// 開始日・終了日（両端を含む）と、任意の時間数を保持する。
/// 時間数は部分日の不在（半日研修など）を計画系が扱うための補足情報。
///
/// # 不変条件
///
/// - `start <= end`
/// - `duration_hours` を指定する場合は 1 以上
///
/// # 使用例
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use chrono::NaiveDate;
/// use leaveflow_domain::absence::Period;
///
/// let period = Period::new(
///     NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
///     None,
/// )?;
/// assert_eq!(period.days(), 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    start:          NaiveDate,
    end:            NaiveDate,
    duration_hours: Option<i32>,
}

impl Period {
    /// 期間を作成する
    ///
    /// # バリデーション
    ///
    /// - `start <= end` であること
    /// - `duration_hours` を指定する場合は 1 以上であること
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    /// ストアへの書き込みより前に呼び出し元で検証される。
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        duration_hours: Option<i32>,
    ) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::Validation(
                "期間の開始日は終了日以前である必要があります".to_string(),
            ));
        }

        if let Some(hours) = duration_hours
            && hours < 1
        {
            return Err(DomainError::Validation(
                "時間数は 1 以上である必要があります".to_string(),
            ));
        }

        Ok(Self {
            start,
            end,
            duration_hours,
        })
    }

    /// 開始日を取得する
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// 終了日を取得する（この日を含む）
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 時間数を取得する（未指定の場合は None）
    pub fn duration_hours(&self) -> Option<i32> {
        self.duration_hours
    }

    /// 期間の日数を返す（両端を含む）
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_開始日と終了日が同日の期間は有効() {
        let period = Period::new(date(2025, 7, 1), date(2025, 7, 1), None).unwrap();
        assert_eq!(period.days(), 1);
    }

    #[test]
    fn test_開始日が終了日より後の期間は無効() {
        assert!(Period::new(date(2025, 7, 2), date(2025, 7, 1), None).is_err());
    }

    #[test]
    fn test_日数は両端を含めて数えられる() {
        let period = Period::new(date(2025, 7, 1), date(2025, 7, 4), None).unwrap();
        assert_eq!(period.days(), 4);
    }

    #[rstest]
    #[case(Some(1))]
    #[case(Some(8))]
    #[case(None)]
    fn test_有効な時間数は受け入れられる(#[case] hours: Option<i32>) {
        assert!(Period::new(date(2025, 7, 1), date(2025, 7, 1), hours).is_ok());
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    fn test_1未満の時間数は拒否される(#[case] hours: i32) {
        assert!(Period::new(date(2025, 7, 1), date(2025, 7, 1), Some(hours)).is_err());
    }

    #[test]
    fn test_月をまたぐ期間の日数() {
        let period = Period::new(date(2025, 1, 30), date(2025, 2, 2), None).unwrap();
        assert_eq!(period.days(), 4);
    }
}
