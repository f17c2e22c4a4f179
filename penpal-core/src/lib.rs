//! Penpal Core Library
//!
//! Sealed letters with proof-of-work stamps.
//! All cryptographic operations use the audited `ring` crate.

pub mod cache;
pub mod compose;
pub mod crypto;
pub mod error;
pub mod event;
pub mod pow;

pub use cache::{
    CacheError, CacheScope, CacheStats, CachedLetter, DecryptedLetter, EvictionPolicy,
    EvictionReport, FileStore, LetterCache, LetterStore, MemoryStore, SqliteStore, StoreError,
};
pub use compose::{
    compose_note, read_letter, receive_letter, relays_for_event, ComposeError, LetterDraft,
    RelayListItem, RelayListProvider, StaticRelayList,
};
pub use crypto::{open, open_base64, seal, seal_to_base64, CipherError, SealedBlob, SymmetricKey};
pub use error::{PenpalError, PenpalResult};
pub use event::{kinds, leading_zero_bits, EventError, NostrEvent, UnsignedEvent};
pub use pow::{
    MiningConfig, MiningError, MiningOutcome, MiningRequest, MiningResponse, MiningResult,
    MiningSupervisor, PowMiner, PowNoteRequest, RequestId,
};
