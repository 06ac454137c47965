use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use foamfile::{
    Compression, EncodeOptions, Format, FoamFile, KeyPath, ParseOptions, Precision, Value,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "foamfile", version, about = "Read and edit OpenFOAM FoamFiles")]
struct Args {
    /// Log parser and file activity to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a file, decompressed, or its content as JSON.
    Show {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the value at a key path such as `solvers/p/tolerance`.
    Get { file: PathBuf, path: String },
    /// Replace or insert the value at a key path, in place.
    Set {
        file: PathBuf,
        path: String,
        value: String,
    },
    /// Delete the entry at a key path, in place.
    Remove { file: PathBuf, path: String },
    /// Re-encode a file, optionally changing its format or precision.
    Convert {
        file: PathBuf,
        #[arg(short, long, value_name = "file")]
        output: PathBuf,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        #[arg(long, value_enum)]
        precision: Option<PrecisionArg>,
        #[arg(long)]
        gzip: bool,
    },
    /// Parse a file and report the first error.
    Check { file: PathBuf },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Ascii,
    Binary,
}

impl From<FormatArg> for Format {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Ascii => Format::Ascii,
            FormatArg::Binary => Format::Binary,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PrecisionArg {
    Single,
    Double,
}

impl From<PrecisionArg> for Precision {
    fn from(value: PrecisionArg) -> Self {
        match value {
            PrecisionArg::Single => Precision::Single,
            PrecisionArg::Double => Precision::Double,
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    if let Err(err) = run(args.command) {
        eprintln!("ERROR  {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    debug!(?command, "running command");
    match command {
        Command::Show { file, json } => run_show(&file, json),
        Command::Get { file, path } => run_get(&file, &path),
        Command::Set { file, path, value } => run_set(&file, &path, &value),
        Command::Remove { file, path } => run_remove(&file, &path),
        Command::Convert {
            file,
            output,
            format,
            precision,
            gzip,
        } => {
            let mut options = EncodeOptions::new();
            if let Some(format) = format {
                options = options.with_format(format.into());
            }
            if let Some(precision) = precision {
                options = options.with_precision(precision.into());
            }
            if gzip {
                options = options.with_compression(Compression::Gzip);
            }
            run_convert(&file, &output, &options)
        }
        Command::Check { file } => run_check(&file),
    }
}

fn run_show(file: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    let foam = FoamFile::open(file)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if json {
        let text = foamfile::json::to_json_string(foam.document(), true)?;
        writeln!(handle, "{text}")?;
    } else {
        handle.write_all(foam.document().as_bytes())?;
    }
    Ok(())
}

fn run_get(file: &Path, path: &str) -> Result<(), Box<dyn Error>> {
    let foam = FoamFile::open(file)?;
    let key_path = KeyPath::parse(path)?;
    let entry = foam
        .document()
        .entry(&key_path)
        .ok_or_else(|| foamfile::Error::not_found(&key_path))?;
    let text = match &entry.value {
        Some(Value::Dict(dict)) => {
            let bytes = foamfile::encode_dictionary(dict, &EncodeOptions::default())?;
            String::from_utf8_lossy(&bytes).trim_end().to_string()
        }
        Some(value) => value.to_string(),
        None => String::new(),
    };
    println!("{text}");
    Ok(())
}

fn run_set(file: &Path, path: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut foam = FoamFile::open(file)?;
    let key_path = KeyPath::parse(path)?;
    let value = foamfile::parse_value(value.as_bytes())?;
    foam.set(&key_path, value)?;
    foam.save()?;
    Ok(())
}

fn run_remove(file: &Path, path: &str) -> Result<(), Box<dyn Error>> {
    let mut foam = FoamFile::open(file)?;
    foam.remove(&KeyPath::parse(path)?)?;
    foam.save()?;
    Ok(())
}

fn run_convert(file: &Path, output: &Path, options: &EncodeOptions) -> Result<(), Box<dyn Error>> {
    let foam = FoamFile::open(file)?;
    foam.save_as(output, options)?;
    println!("✔ Converted {} → {}", file.display(), output.display());
    Ok(())
}

fn run_check(file: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = foamfile::io::read(file)?;
    match foamfile::parse_with_options(&bytes, &ParseOptions::default()) {
        Ok(doc) => {
            println!("✔ {} ({} entries)", file.display(), doc.entries().len());
            Ok(())
        }
        Err(err) => Err(format!("{}\n{}", file.display(), err.render(&bytes)).into()),
    }
}
