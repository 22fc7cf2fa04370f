//! The metadata provider interface (§4.2, §6) and the registry that
//! dispatches a `(name, subfield)` lookup to exactly one registered
//! provider.
//!
//! This is the narrow seam the core calls through; concrete extractors
//! (audio tags, EXIF, `mdls`, PDF, DOCX, ...) are Non-goals of this crate
//! and live in host applications. A handful of zero-dependency providers
//! ship here because they need no external extractor and let the crate's
//! own tests exercise a real render end to end (see `SPEC_FULL.md` §1).

use crate::datetime::Instant;
use crate::value::{path_to_string, MetaValue};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Per-file context handed to every provider lookup (§6).
#[derive(Debug, Clone)]
pub struct FileContext {
    /// The source file or directory being rendered for.
    pub path: PathBuf,
    /// The instant used to resolve `today`/`now`. Supplied by the caller
    /// rather than read from the system clock inside the library, so
    /// that a render is a pure function of its inputs (SPEC_FULL.md
    /// Open Question OQ-5).
    pub now: Instant,
    /// An optional snapshot of filesystem metadata, backing `size`,
    /// `created`, `modified`, `accessed`, `uid`, `gid`, `user`, `group`.
    /// `None` means those fields resolve to `Null`.
    pub stat: Option<FileStat>,
}

impl FileContext {
    pub fn new(path: impl Into<PathBuf>, now: Instant) -> Self {
        Self {
            path: path.into(),
            now,
            stat: None,
        }
    }

    pub fn with_stat(mut self, stat: FileStat) -> Self {
        self.stat = Some(stat);
        self
    }
}

/// A caller-supplied snapshot of filesystem metadata. Kept separate from
/// `std::fs::Metadata` so that tests and non-Unix hosts can construct one
/// without touching a real filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileStat {
    pub size: Option<u64>,
    pub created: Option<Instant>,
    pub modified: Option<Instant>,
    pub accessed: Option<Instant>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub user: Option<String>,
    pub group: Option<String>,
}

/// A pluggable metadata source, addressed by top-level field name (§4.2).
///
/// Implementations must be pure functions of `(name, subfield, ctx)` for
/// a given file (§6); if a provider caches internally (e.g. one
/// `exiftool` invocation per file), cache invalidation is per-file and is
/// the provider's own responsibility.
///
/// `lookup` returns `Err` for extractor failure (e.g. `exiftool` missing
/// from `$PATH`), distinct from `Ok(MetaValue::Null)` for "field absent
/// but the extractor ran fine" (§7 `ProviderError`). The registry's
/// [`ProviderPolicy`] for `name` decides whether the renderer propagates
/// that failure or degrades it to `Null`.
pub trait Provider: Send + Sync {
    fn lookup(&self, subfield: Option<&str>, ctx: &FileContext) -> Result<MetaValue, ProviderFailure>;
}

/// A provider's lookup failure, carrying the underlying extractor error.
#[derive(Debug)]
pub struct ProviderFailure(pub Box<dyn std::error::Error + Send + Sync>);

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ProviderFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// Declares whether a registry should propagate a provider's failure or
/// swallow it as `Null` (§7 `ProviderError`). Built-in providers never
/// fail, so this only matters for host-registered extractors, but the
/// registry still records a policy per name so host code can express
/// "exiftool is mandatory, Finder tags are optional" uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ProviderPolicy {
    /// A lookup failure is a fatal `RenderError::Provider`.
    Hard,
    /// A lookup failure degrades silently to `MetaValue::Null`.
    #[default]
    Soft,
}

/// Maps top-level field names to providers. Immutable after
/// construction (§5): a process may run many renders concurrently by
/// sharing one `&ProviderRegistry` across independent `Renderer`s.
pub struct ProviderRegistry {
    providers: HashMap<String, (Box<dyn Provider>, ProviderPolicy)>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// An empty registry with only the always-available built-ins
    /// (punctuation, `filepath`, `today`, `now`, and the `FileStat`-backed
    /// fields). `var`, `strip` and `format` are handled directly by the
    /// renderer (§4.2) and are never looked up here.
    pub fn new() -> Self {
        let mut reg = Self {
            providers: HashMap::new(),
        };
        reg.register("filepath", Box::new(FilePathProvider), ProviderPolicy::Soft);
        reg.register("today", Box::new(TodayProvider), ProviderPolicy::Soft);
        reg.register("now", Box::new(NowProvider), ProviderPolicy::Soft);
        reg.register("size", Box::new(StatProvider(StatField::Size)), ProviderPolicy::Soft);
        reg.register(
            "created",
            Box::new(StatProvider(StatField::Created)),
            ProviderPolicy::Soft,
        );
        reg.register(
            "modified",
            Box::new(StatProvider(StatField::Modified)),
            ProviderPolicy::Soft,
        );
        reg.register(
            "accessed",
            Box::new(StatProvider(StatField::Accessed)),
            ProviderPolicy::Soft,
        );
        reg.register("uid", Box::new(StatProvider(StatField::Uid)), ProviderPolicy::Soft);
        reg.register("gid", Box::new(StatProvider(StatField::Gid)), ProviderPolicy::Soft);
        reg.register("user", Box::new(StatProvider(StatField::User)), ProviderPolicy::Soft);
        reg.register("group", Box::new(StatProvider(StatField::Group)), ProviderPolicy::Soft);
        for (name, value) in crate::punctuation::TABLE {
            reg.register(name, Box::new(PunctuationProvider(value)), ProviderPolicy::Soft);
        }
        reg
    }

    /// Registers (or replaces) the provider for `name`. Host applications
    /// use this to add `audio`, `exiftool`, `mdls`, `finder`, `uti`,
    /// `pdf`, `docx`, or any other extractor.
    pub fn register(&mut self, name: impl Into<String>, provider: Box<dyn Provider>, policy: ProviderPolicy) {
        self.providers.insert(name.into(), (provider, policy));
    }

    /// A provider's effective failure policy: an override in
    /// [`crate::config::RENDER_CFG`]'s `provider_policy` table takes
    /// precedence over the policy it was [`register`](Self::register)ed
    /// with, so a host can flip `exiftool` to `Hard` at startup without
    /// touching the code that builds the registry.
    pub fn policy(&self, name: &str) -> Option<ProviderPolicy> {
        if let Some(p) = crate::config::RENDER_CFG.read().provider_policy.get(name) {
            return Some(*p);
        }
        self.providers.get(name).map(|(_, policy)| *policy)
    }

    pub fn lookup(
        &self,
        name: &str,
        subfield: Option<&str>,
        ctx: &FileContext,
    ) -> Option<Result<MetaValue, ProviderFailure>> {
        self.providers.get(name).map(|(provider, _)| {
            log::trace!("dispatching lookup: name={name:?} subfield={subfield:?}");
            provider.lookup(subfield, ctx)
        })
    }
}

struct FilePathProvider;
impl Provider for FilePathProvider {
    fn lookup(&self, _subfield: Option<&str>, ctx: &FileContext) -> Result<MetaValue, ProviderFailure> {
        Ok(MetaValue::scalar(path_to_string(&ctx.path)))
    }
}

struct TodayProvider;
impl Provider for TodayProvider {
    fn lookup(&self, _subfield: Option<&str>, ctx: &FileContext) -> Result<MetaValue, ProviderFailure> {
        Ok(MetaValue::DateTime(ctx.now))
    }
}

struct NowProvider;
impl Provider for NowProvider {
    fn lookup(&self, _subfield: Option<&str>, ctx: &FileContext) -> Result<MetaValue, ProviderFailure> {
        Ok(MetaValue::DateTime(ctx.now))
    }
}

#[derive(Clone, Copy)]
enum StatField {
    Size,
    Created,
    Modified,
    Accessed,
    Uid,
    Gid,
    User,
    Group,
}

struct StatProvider(StatField);
impl Provider for StatProvider {
    fn lookup(&self, _subfield: Option<&str>, ctx: &FileContext) -> Result<MetaValue, ProviderFailure> {
        let Some(stat) = &ctx.stat else {
            return Ok(MetaValue::Null);
        };
        Ok(match self.0 {
            StatField::Size => stat.size.map_or(MetaValue::Null, |v| MetaValue::scalar(v.to_string())),
            StatField::Created => stat.created.map_or(MetaValue::Null, MetaValue::DateTime),
            StatField::Modified => stat.modified.map_or(MetaValue::Null, MetaValue::DateTime),
            StatField::Accessed => stat.accessed.map_or(MetaValue::Null, MetaValue::DateTime),
            StatField::Uid => stat.uid.map_or(MetaValue::Null, |v| MetaValue::scalar(v.to_string())),
            StatField::Gid => stat.gid.map_or(MetaValue::Null, |v| MetaValue::scalar(v.to_string())),
            StatField::User => stat.user.clone().map_or(MetaValue::Null, MetaValue::scalar),
            StatField::Group => stat.group.clone().map_or(MetaValue::Null, MetaValue::scalar),
        })
    }
}

struct PunctuationProvider(&'static str);
impl Provider for PunctuationProvider {
    fn lookup(&self, _subfield: Option<&str>, _ctx: &FileContext) -> Result<MetaValue, ProviderFailure> {
        Ok(MetaValue::scalar(self.0))
    }
}

/// Unused when no stat backend is wired up; kept so host integrations
/// building a `FileStat` from `std::fs::Metadata` have a shared helper
/// for the common Unix fields.
#[cfg(unix)]
pub fn stat_from_std(meta: &std::fs::Metadata) -> FileStat {
    use chrono::{DateTime, Utc};
    use std::os::unix::fs::MetadataExt;
    let to_instant = |t: std::io::Result<std::time::SystemTime>| -> Option<Instant> {
        t.ok().map(DateTime::<Utc>::from)
    };
    FileStat {
        size: Some(meta.len()),
        created: to_instant(meta.created()),
        modified: to_instant(meta.modified()),
        accessed: to_instant(meta.accessed()),
        uid: Some(meta.uid()),
        gid: Some(meta.gid()),
        user: None,
        group: None,
    }
}
