//! M3U playlist writer

use std::io::Write;
use std::path::Path;

use crate::record::ParsedRecord;
use crate::Result;

/// Write an extended M3U playlist, overwriting any existing file.
///
/// Each record contributes an `#EXTINF` metadata line with its base filename
/// as the display name, then its resolved path, in input order.
pub fn write_m3u(path: &Path, records: &[ParsedRecord]) -> Result<()> {
    let mut file = std::fs::File::create(path)?;

    writeln!(file, "#EXTM3U")?;
    for record in records {
        writeln!(file, "#EXTINF:-1,{}", record.filename)?;
        writeln!(file, "{}", record.source_path.display())?;
    }
    file.flush()?;

    tracing::info!(
        playlist = %path.display(),
        tracks = records.len(),
        "Playlist written"
    );
    Ok(())
}
