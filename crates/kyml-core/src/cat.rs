use crate::merge::ManifestSet;
use crate::order::sort_by_dependencies;
use crate::CoreError;
use kyml_schema::{decode_reader, Document};
use kyml_store::Filesystem;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where a batch of manifest documents comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Stdin,
}

impl Source {
    /// `-` means standard input; anything else is a file path.
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdin => f.write_str("<stdin>"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CatOptions {
    /// Apply dependency ordering after deduplication.
    pub sort: bool,
}

impl Default for CatOptions {
    fn default() -> Self {
        Self { sort: true }
    }
}

impl CatOptions {
    pub fn unsorted() -> Self {
        Self { sort: false }
    }
}

/// Read every source in order and fold its documents into one deduplicated
/// sequence, optionally ordered by dependencies.
///
/// `stdin` is consumed by the first [`Source::Stdin`]; later ones read
/// nothing. Any unreadable or unparseable source aborts the whole run.
pub fn concatenate(
    fs: &dyn Filesystem,
    sources: &[Source],
    stdin: &mut dyn Read,
    options: CatOptions,
) -> Result<Vec<Document>, CoreError> {
    let mut set = ManifestSet::new();
    for source in sources {
        let docs = match source {
            Source::File(path) => {
                let reader = fs.open(path).map_err(|e| input_error(source, &e))?;
                decode_reader(reader).map_err(|e| input_error(source, &e))?
            }
            Source::Stdin => decode_reader(&mut *stdin).map_err(|e| input_error(source, &e))?,
        };
        debug!("{source}: {} document(s)", docs.len());
        set.extend(docs);
    }
    info!(
        "concatenated {} source(s) into {} document(s)",
        sources.len(),
        set.len()
    );
    Ok(finish(set, options))
}

/// Deduplicate (and optionally order) the documents of a single stream.
pub fn concatenate_stream(
    reader: impl Read,
    options: CatOptions,
) -> Result<Vec<Document>, CoreError> {
    let docs = decode_reader(reader).map_err(|e| input_error(&Source::Stdin, &e))?;
    Ok(finish(docs.into_iter().collect(), options))
}

fn finish(set: ManifestSet, options: CatOptions) -> Vec<Document> {
    let mut docs = set.into_documents();
    if options.sort {
        sort_by_dependencies(&mut docs);
    }
    docs
}

fn input_error(source: &Source, e: &dyn std::error::Error) -> CoreError {
    CoreError::Input {
        name: source.to_string(),
        message: e.to_string(),
    }
}
