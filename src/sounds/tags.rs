use std::{fs::File, path::Path};

use symphonia::core::{
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::{MetadataOptions, MetadataRevision},
    probe::Hint,
};

/// Parses a `weight` tag. Keys match case-insensitively, and namespaced keys
/// such as ID3 `TXXX:weight` count too.
pub fn tag_weight(key: &str, value: &str) -> Option<u32> {
    let name = key.rsplit(':').next().unwrap_or(key).trim();
    if !name.eq_ignore_ascii_case("weight") {
        return None;
    }
    value.trim().parse().ok()
}

fn weight_in(revision: &MetadataRevision) -> Option<u32> {
    revision
        .tags()
        .iter()
        .find_map(|tag| tag_weight(&tag.key, &tag.value.to_string()))
}

/// Reads the clip's `weight` tag. `Ok(None)` means the file probes fine but
/// carries no usable weight; `Err` means it is not an audio file at all.
pub fn read_weight(path: &Path) -> Result<Option<u32>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(&ext.to_lowercase());
    }

    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| e.to_string())?;

    // Tags ahead of the container (ID3v2) come first, then in-stream ones.
    if let Some(weight) = probed
        .metadata
        .get()
        .as_ref()
        .and_then(|m| m.current())
        .and_then(weight_in)
    {
        return Ok(Some(weight));
    }
    Ok(probed.format.metadata().current().and_then(weight_in))
}
