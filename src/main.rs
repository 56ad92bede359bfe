use std::error::Error;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use prettytable::{row, Table};
use tracing_subscriber::EnvFilter;

use mftable::boot::{BootSector, BOOT_SECTOR_SIZE};
use mftable::entry::Entry;
use mftable::export::Export;
use mftable::partition::{MftRecord, Partition};

#[derive(Debug, Parser)]
#[command(name = "mftable", about = "NTFS boot sector and MFT entry parser")]
struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode the boot sector of an NTFS partition image
    Boot { image_path: PathBuf },
    /// Decode a single MFT entry from a file
    Entry { entry_path: PathBuf },
    /// Walk the MFT of a partition image and list its entries
    Walk {
        image_path: PathBuf,
        /// Record number to start at
        #[arg(long, default_value_t = 0)]
        start: u64,
        /// Stop after this many records
        #[arg(long)]
        count: Option<u64>,
        /// Print the full field tables instead of the summary listing
        #[arg(long)]
        attributes: bool,
        /// Write every exported field to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Extract raw 1024-byte MFT entries to files
    Extract {
        image_path: PathBuf,
        /// Record number to start at
        #[arg(long, default_value_t = 0)]
        start: u64,
        /// How many entries to extract
        #[arg(long, default_value_t = 1)]
        count: u64,
        /// Directory the entry files are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Arguments::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Arguments) -> Result<(), Box<dyn Error>> {
    match args.command {
        Command::Boot { image_path } => show_boot(&image_path),
        Command::Entry { entry_path } => show_entry(&entry_path),
        Command::Walk {
            image_path,
            start,
            count,
            attributes,
            csv,
        } => walk(&image_path, start, count, attributes, csv.as_deref()),
        Command::Extract {
            image_path,
            start,
            count,
            out_dir,
        } => extract(&image_path, start, count, &out_dir),
    }
}

fn read_boot_sector(image_path: &Path) -> Result<BootSector, Box<dyn Error>> {
    let mut block = [0u8; BOOT_SECTOR_SIZE];
    File::open(image_path)?.read_exact(&mut block)?;
    let boot = BootSector::parse(&block)?;
    boot.validate()?;
    Ok(boot)
}

fn show_boot(image_path: &Path) -> Result<(), Box<dyn Error>> {
    let boot = read_boot_sector(image_path)?;
    let mut table = Table::new();
    table.add_row(row!["OEM name", boot.oem_name_str()]);
    table.add_row(row!["Bytes per sector", boot.bytes_per_sector]);
    table.add_row(row!["Sectors per cluster", boot.sectors_per_cluster]);
    table.add_row(row!["Cluster size (bytes)", boot.cluster_bytes()]);
    table.add_row(row!["Total sectors", boot.total_sectors]);
    table.add_row(row!["MFT start cluster", boot.mft_start_cluster]);
    table.add_row(row!["MFT mirror start cluster", boot.mft_mirror_start_cluster]);
    table.add_row(row!["MFT start offset (bytes)", boot.mft_start_offset_bytes()]);
    table.add_row(row!["Entry size code", boot.entry_size_code]);
    table.add_row(row!["Index record size code", boot.index_record_size_code]);
    table.add_row(row!["Serial number", format!("{:#018x}", boot.serial_number)]);
    table.add_row(row!["Signature", format!("{:#06x}", boot.signature)]);
    table.printstd();
    Ok(())
}

fn show_entry(entry_path: &Path) -> Result<(), Box<dyn Error>> {
    let data = fs::read(entry_path)?;
    let entry = Entry::new(&data)?;
    entry.validate()?;
    print_entry_tables(&entry);
    Ok(())
}

fn print_entry_tables(entry: &Entry<'_>) {
    println!("Filename: {}", entry.filename());
    let mut table = Table::new();
    for export_row in entry.export() {
        table.add_row(row![export_row.label, export_row.value]);
    }
    table.printstd();

    for attribute in entry.attributes() {
        match attribute.type_name() {
            Some(name) => println!("{}", name),
            None => println!("{:#x}", attribute.type_code()),
        }
        let mut table = Table::new();
        for export_row in attribute.export() {
            table.add_row(row![export_row.label, export_row.value]);
        }
        table.printstd();
    }
}

fn walk(
    image_path: &Path,
    start: u64,
    count: Option<u64>,
    attributes: bool,
    csv_path: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let partition = Partition::open(image_path)?;
    let limit = count.unwrap_or(u64::MAX) as usize;
    let mut writer = match csv_path {
        Some(path) => {
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(["record", "attribute", "field", "value"])?;
            Some(writer)
        }
        None => None,
    };

    let mut summary = Table::new();
    summary.add_row(row!["Record", "Filename", "Flags", "Sequence", "Used size"]);
    let mut yielded = 0usize;
    for record in partition.records(start)?.take(limit) {
        let record = record?;
        let entry = record.entry()?;
        if attributes {
            println!("Record {} at byte offset {}", record.index, record.offset);
            print_entry_tables(&entry);
        } else {
            summary.add_row(row![
                record.index,
                entry.filename(),
                entry.flags.render(),
                entry.sequence.as_u64(),
                entry.used_size.as_u64(),
            ]);
        }
        if let Some(writer) = writer.as_mut() {
            write_entry_csv(writer, &record, &entry)?;
        }
        yielded += 1;
    }
    if !attributes {
        summary.printstd();
    }
    println!("# of Records: {}", yielded);
    if let Some(mut writer) = writer {
        writer.flush()?;
    }
    Ok(())
}

fn write_entry_csv(
    writer: &mut csv::Writer<File>,
    record: &MftRecord,
    entry: &Entry<'_>,
) -> Result<(), Box<dyn Error>> {
    let record_number = record.index.to_string();
    for export_row in entry.export() {
        writer.write_record([
            record_number.as_str(),
            "entry",
            export_row.label,
            export_row.value.as_str(),
        ])?;
    }
    for attribute in entry.attributes() {
        let attribute_name = match attribute.type_name() {
            Some(name) => name.to_owned(),
            None => format!("{:#x}", attribute.type_code()),
        };
        for export_row in attribute.export() {
            writer.write_record([
                record_number.as_str(),
                attribute_name.as_str(),
                export_row.label,
                export_row.value.as_str(),
            ])?;
        }
    }
    Ok(())
}

fn extract(
    image_path: &Path,
    start: u64,
    count: u64,
    out_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let partition = Partition::open(image_path)?;
    fs::create_dir_all(out_dir)?;
    let mut written = 0u64;
    for block in partition.blocks(start)?.take(count as usize) {
        let block = block?;
        let out_path = out_dir.join(format!("{}_mft.bin", block.index));
        fs::write(&out_path, block.as_bytes())?;
        println!("{}", out_path.display());
        written += 1;
    }
    if written < count {
        eprintln!("Reached end of MFT after {} of {} entries", written, count);
    }
    Ok(())
}
