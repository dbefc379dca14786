//! Standard SBS audit rules
//!
//! | Code     | Check                                   | Severity |
//! |----------|-----------------------------------------|----------|
//! | SBS001   | code exists and is listed               | critical |
//! | SBS002   | diagnosis supports the service          | high     |
//! | SBS003   | documentation present and complete      | medium   |
//! | SBS004-U | component billed with its comprehensive | high     |
//! | SBS004-C | tier not supported by diagnoses         | high     |
//! | SBS004-D | duplicate billing                       | high     |
//! | SBS004-F | amount above fee schedule               | medium   |
//! | SBS005   | daily limit or overlapping services     | medium   |

pub mod billing;
pub mod clinical;
pub mod coding;
pub mod documentation;
pub mod timing;

pub use billing::{DuplicateBillingRule, FeeScheduleRule, UnbundlingRule, UpcodingRule};
pub use clinical::MedicalNecessityRule;
pub use coding::CodeValidityRule;
pub use documentation::DocumentationRule;
pub use timing::SameDayTimingRule;
