//! **matcat** - Builds PBR material node graphs from folders of texture images
//!
//! Keyword classification of texture files into shading channels, a
//! host-independent node graph per material, and an append-only catalog
//! ledger that keeps folder-derived catalog IDs stable across runs.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core pipeline - classification, graph synthesis and cataloging
pub mod core {
    /// Shading channels and candidate image files
    pub mod channel;
    pub use channel::{Channel, ChannelDef, ImageFile};

    /// File-name tokenizer and shared-affix reduction
    pub mod tokenize;
    pub use tokenize::{reduce, tokenize};

    /// Channel assignment and multi-candidate resolution
    pub mod classify;
    pub use classify::{AlternatePolicy, MaterialPlan, ResolutionPriority, classify, resolve};

    /// Host-independent shader node graph
    pub mod graph;
    pub use graph::{NodeGraph, NodeKind, Socket};

    /// Material graph synthesis from a resolved plan
    pub mod synth;
    pub use synth::{SurfaceDetail, SynthSettings, synthesize};

    /// Display-name formatting and unique material names
    pub mod naming;
    pub use naming::{MaterialNamespace, NameFormat};

    /// Append-only catalog ledger with advisory locking
    pub mod catalog;
    pub use catalog::{CatalogError, CatalogLedger};

    /// Library-wide generation pipeline
    pub mod generate;
    pub use generate::{GenerateError, MaterialRecord, generate, run as generate_run};
}

/// Secondary commands that only inspect state
pub mod cli_ext {
    /// Per-folder classification preview
    pub mod classify_cmd;

    /// Catalog ledger tree listing
    pub mod catalog_cmd;
}

/// Infrastructure - configuration and library walking
pub mod infra {
    /// Layered configuration (file + environment)
    pub mod config;
    pub use config::{Config, Settings, init as config_init, load_config};

    /// Gitignore-aware folder walking
    pub mod walk;
    pub use walk::FolderWalker;
}

pub use cli::{AppContext, Cli, Commands};
pub use cli_ext::{catalog_cmd::run as catalog_run, classify_cmd::run as classify_run};
pub use core::generate_run;
pub use infra::{Config, FolderWalker, Settings, load_config};
