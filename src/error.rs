//! Crate-level error types for document assembly, resolution, and mutation.

/// All errors in oasdir carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, path, or reference involved.
#[allow(clippy::error_impl_error, reason = "crate-level error re-exported as oasdir::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A reference chain revisited a reference it had already followed.
    #[error("cyclic reference: {}", chain.join(" -> "))]
    CyclicReference {
        /// Ordered chain of reference strings, ending with the repeated one.
        chain: Vec<String>,
    },

    /// File bytes parse as neither supported format for the expected entity.
    #[error("decode failed: {path}: {reason}")]
    Decode {
        /// File path relative to the document root.
        path: String,
        /// Description of the decode failure from the last format tried.
        reason: String,
    },

    /// A path is already registered in the document.
    #[error("path already exists: `{path}`")]
    DuplicatePath {
        /// The route string that already exists.
        path: String,
    },

    /// An entity could not be encoded to bytes.
    #[error("encode failed: {path}: {reason}")]
    Encode {
        /// File path the entity would have been written to.
        path: String,
        /// Description of the encode failure.
        reason: String,
    },

    /// A file already backs another entity at this location.
    #[error("file already exists: {path}")]
    FileExists {
        /// File path relative to the document root.
        path: String,
    },

    /// An intermediate group is missing while walking the path group tree.
    #[error("group not found: /{}", components.join("/"))]
    GroupNotFound {
        /// Group components walked so far, ending with the missing one.
        components: Vec<String>,
    },

    /// A group name or group path cannot be used.
    #[error("invalid group: {reason}")]
    InvalidGroup {
        /// Why the group was rejected.
        reason: String,
    },

    /// A path cannot be moved into the requested group.
    #[error("cannot move `{path}`: {reason}")]
    InvalidMove {
        /// The route string being moved.
        path: String,
        /// Why the move was rejected.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// A reference string has an unrecognized shape.
    #[error("malformed reference: `{reference}`")]
    MalformedReference {
        /// The offending reference string.
        reference: String,
    },

    /// A directory has none of the canonical main file names at its top level.
    #[error("no main file found (looked for {})", searched.join(", "))]
    MissingMainFile {
        /// The candidate names that were searched, in priority order.
        searched: Vec<String>,
    },

    /// A route is not present in the document.
    #[error("path not found: `{path}`")]
    PathNotFound {
        /// The route string that was looked up.
        path: String,
    },

    /// A save would replace a file with a directory, or a directory with a file.
    #[error("cannot save to {path}: {reason}")]
    TargetMismatch {
        /// The save target.
        path: String,
        /// What is on disk and what the document would write.
        reason: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A reference that must resolve for the operation to proceed is dangling.
    #[error("unresolved reference: `{reference}`")]
    UnresolvedReference {
        /// The dangling reference string.
        reference: String,
    },

    /// An on-disk entry a file tree cannot hold, such as a symlink, would be
    /// lost by replacing its directory.
    #[error("unsupported entry: {path}")]
    UnsupportedEntry {
        /// Entry path relative to the document root.
        path: String,
    },

    /// Directory traversal failed.
    #[error("walk: {0}")]
    Walk(
        /// The wrapped traversal error.
        #[from]
        walkdir::Error,
    ),
}
