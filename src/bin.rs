use clap::Parser;
use crossfill::backtracking_search::find_fill;
use crossfill::grid_config::{render_grid, GridConfig};
use crossfill::word_list::{WordList, WordListError};
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// File extensions rejected for the text output.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

/// crossfill: Fill a crossword grid from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file: one row per line, `_` for an open square and `#` for a block
    structure: PathBuf,

    /// Path to the word list file, one word per line
    words: PathBuf,

    /// Where to also write the filled grid, as UTF-8 text (image formats aren't supported)
    text_output: Option<PathBuf>,

    /// Log more detail to stderr (repeat for more); `RUST_LOG` takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn check_text_output_path(path: &Path) -> Result<(), Error> {
    let is_image = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|image_extension| extension.eq_ignore_ascii_case(image_extension))
        });

    if is_image {
        return Err(Error(format!(
            "Can't write an image to '{}'; the output is plain text, try a .txt path",
            path.display()
        )));
    }

    Ok(())
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(text_output) = &args.text_output {
        check_text_output_path(text_output)?;
    }

    let grid_config =
        GridConfig::from_structure_file(&args.structure).map_err(|e| Error(e.to_string()))?;

    // Nothing longer than the grid's longest side can ever be placed.
    let max_side = grid_config.width.max(grid_config.height);
    let word_list = WordList::from_dict_file(&args.words, Some(max_side))
        .map_err(|e| Error(e.to_string()))?;

    if word_list.is_empty() {
        return Err(Error(WordListError::Empty.to_string()));
    }

    let Ok(result) = find_fill(&grid_config, &word_list) else {
        println!("No solution.");
        return Ok(());
    };

    let rendered = render_grid(&grid_config, &word_list, &result.choices);
    println!("{rendered}");

    if let Some(text_output) = &args.text_output {
        fs::write(text_output, format!("{rendered}\n"))
            .map_err(|_| Error(format!("Couldn't write file '{}'", text_output.display())))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::check_text_output_path;
    use std::path::Path;

    #[test]
    fn test_text_output_rejects_image_paths() {
        assert!(check_text_output_path(Path::new("out.png")).is_err());
        assert!(check_text_output_path(Path::new("grids/OUT.JPEG")).is_err());

        assert!(check_text_output_path(Path::new("out.txt")).is_ok());
        assert!(check_text_output_path(Path::new("out")).is_ok());
    }
}
