#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod key;
pub use key::{PreimageKey, PreimageKeyType, L1_HEAD_LOCAL_INDEX};

mod hint;
pub use hint::{Hint, HintType};

pub mod errors;
pub use errors::{HintParsingError, InvalidPreimageKeyType};
