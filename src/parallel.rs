//! Parsing many independent buffers at once.
//!
//! With the `parallel` feature the work is spread over rayon's pool; without
//! it the same functions run sequentially. Each buffer is parsed on its own,
//! so results never depend on scheduling.

use std::path::Path;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::io::FoamFile;
use crate::options::ParseOptions;
use crate::types::Document;
use crate::Result;

#[cfg(feature = "parallel")]
fn map_items<T, R, F>(items: &[T], func: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.par_iter().map(func).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_items<T, R, F>(items: &[T], func: F) -> Vec<R>
where
    F: Fn(&T) -> R,
{
    items.iter().map(func).collect()
}

/// Parses each buffer; results keep the input order.
pub fn parse_many<B>(inputs: &[B], options: &ParseOptions) -> Vec<Result<Document>>
where
    B: AsRef<[u8]> + Sync,
{
    map_items(inputs, |input| {
        crate::parse_with_options(input.as_ref(), options)
    })
}

/// Opens each file, e.g. every time directory of a case.
pub fn open_many<P>(paths: &[P], options: &ParseOptions) -> Vec<Result<FoamFile>>
where
    P: AsRef<Path> + Sync,
{
    map_items(paths, |path| FoamFile::open_with_options(path, options))
}
