//! SQLx 数据库类型支持
//!
//! 线上枚举按小写字符串落库，与 API 序列化保持一致。
//! BundleState 是推导值，不落库，因此没有对应实现。

use crate::entities::{ComponentKind, ProfileKind, ProfileState};

// ============================================================================
// ComponentKind
// ============================================================================

impl sqlx::Type<sqlx::Sqlite> for ComponentKind {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ComponentKind {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "pd" => Ok(ComponentKind::Pd),
            "tidb" => Ok(ComponentKind::Tidb),
            "tikv" => Ok(ComponentKind::Tikv),
            "tiflash" => Ok(ComponentKind::Tiflash),
            _ => Err(format!("Invalid component kind: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ComponentKind {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

// ============================================================================
// ProfileKind
// ============================================================================

impl sqlx::Type<sqlx::Sqlite> for ProfileKind {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ProfileKind {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "cpu" => Ok(ProfileKind::Cpu),
            "heap" => Ok(ProfileKind::Heap),
            "mutex" => Ok(ProfileKind::Mutex),
            "goroutine" => Ok(ProfileKind::Goroutine),
            _ => Err(format!("Invalid profile kind: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ProfileKind {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

// ============================================================================
// ProfileState
// ============================================================================

impl sqlx::Type<sqlx::Sqlite> for ProfileState {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ProfileState {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "running" => Ok(ProfileState::Running),
            "succeeded" => Ok(ProfileState::Succeeded),
            "error" => Ok(ProfileState::Error),
            "skipped" => Ok(ProfileState::Skipped),
            _ => Err(format!("Invalid profile state: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ProfileState {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}
