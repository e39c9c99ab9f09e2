//! Record model shared by every stage of a reconciliation run
//!
//! - [`Record`]: canonical, provider-agnostic record
//! - [`NativeRecordSet`] / [`NativeRow`]: provider-side shapes
//! - [`Original`]: back-reference from canonical to native
//! - [`Correction`]: one executable API call plus its message

pub mod correction;
pub mod native;
pub mod record;

pub use correction::{Correction, CorrectionFuture};
pub use native::{NativeRecordSet, NativeRecords, NativeRow, Original, RowDelta, ZoneRef};
pub use record::{DEFAULT_TTL, Record, RecordKey, RecordType, normalize_zone, qualify, quote_txt};
