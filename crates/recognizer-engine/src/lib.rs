//! The non-deterministic template matcher and the recognizer driver built
//! on top of it.
//!
//! ```
//! use indexmap::IndexMap;
//! use recognizer_core::expression::{Expression, SequenceKind};
//! use recognizer_core::intents::{Intent, IntentData, Intents};
//! use recognizer_core::slots::{SlotList, TextSlotList, TextSlotValue};
//! use recognizer_engine::{recognize, RecognizeOptions};
//! use serde_json::Value;
//!
//! let mut intents = Intents::new();
//! intents.slot_lists.insert(
//!     "names".to_string(),
//!     SlotList::Text(TextSlotList {
//!         values: vec![TextSlotValue::new(
//!             Expression::TextChunk("kitchen light".into()),
//!             Value::String("light.kitchen".into()),
//!         )],
//!     }),
//! );
//!
//! let sentence = Expression::Sequence(
//!     SequenceKind::Group,
//!     vec![
//!         Expression::TextChunk("turn on the ".into()),
//!         Expression::ListReference { slot_name: "name".into(), list_name: "names".into() },
//!     ],
//! );
//! let mut intent = Intent::new("HassTurnOn");
//! intent.data.push(IntentData::new(vec![sentence]));
//! intents.intents.insert("HassTurnOn".to_string(), intent);
//!
//! let result = recognize("turn on the kitchen light", &intents, &RecognizeOptions::new())
//!     .expect("no structural errors")
//!     .expect("a match");
//! assert_eq!(result.entities["name"].value, Value::String("light.kitchen".into()));
//! ```

pub mod context;
pub mod error;
pub mod matcher;
pub mod recognize;
pub mod single;

pub use context::{MatchContext, MatchSettings};
pub use error::{EngineError, Result};
pub use matcher::match_expression;
pub use recognize::{recognize, recognize_all, RecognizeOptions, RecognizeResult};
pub use single::{is_match, SingleMatchOptions};
