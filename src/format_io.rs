/// Reading trajectory tables and writing result tables
///
/// Both tab- and comma-separated tables are supported. The first column holds
/// row ids, every other header is a numeric timepoint.
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;

use crate::assemble::{
    annotated_trajectory_table, edge_table, genotype_member_table, population_table,
};
use crate::error::{MullerError, Result};
use crate::pipeline::AnalysisResult;
use crate::table::TrajectoryTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Tsv,
    Csv,
}

impl TableFormat {
    pub fn delimiter(self) -> u8 {
        match self {
            TableFormat::Tsv => b'\t',
            TableFormat::Csv => b',',
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TableFormat::Tsv => "tsv",
            TableFormat::Csv => "csv",
        }
    }

    /// `.csv` files are comma separated; anything else is read as tab separated.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => TableFormat::Csv,
            _ => TableFormat::Tsv,
        }
    }
}

impl FromStr for TableFormat {
    type Err = MullerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tsv" | "tab" => Ok(TableFormat::Tsv),
            "csv" | "comma" => Ok(TableFormat::Csv),
            _ => Err(MullerError::Parse(format!("Unknown table format: {s}"))),
        }
    }
}

fn parse_frequency(cell: &str, id: &str) -> Result<(f64, bool)> {
    let (number, percent) = match cell.strip_suffix('%') {
        Some(stripped) => (stripped.trim(), true),
        None => (cell, false),
    };
    if number.is_empty() {
        return Err(MullerError::input_shape(format!("row '{id}' has a missing value")));
    }
    let value = number
        .parse::<f64>()
        .map_err(|_| MullerError::Parse(format!("row '{id}': '{cell}' is not a number")))?;
    Ok((value, percent))
}

/// Parse a trajectory table from any reader.
///
/// Frequencies may be fractions or percentages; a table with any value above
/// 1 (or any `%` cell) is scaled down by 100.
pub fn parse_trajectory_table<R: Read>(reader: R, format: TableFormat) -> Result<TrajectoryTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(format.delimiter())
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err(MullerError::input_shape(
            "table needs an id column and at least one timepoint",
        ));
    }
    let timepoints = headers
        .iter()
        .skip(1)
        .map(|h| {
            h.parse::<f64>()
                .map_err(|_| MullerError::Parse(format!("timepoint header '{h}' is not numeric")))
        })
        .collect::<Result<Vec<f64>>>()?;

    let mut ids = Vec::new();
    let mut rows = Vec::new();
    let mut percentages = false;
    for record in rdr.records() {
        let record = record?;
        let Some(id) = record.get(0) else { continue };
        if id.is_empty() && record.iter().all(str::is_empty) {
            continue;
        }
        let mut row = Vec::with_capacity(timepoints.len());
        for cell in record.iter().skip(1) {
            let (value, percent) = parse_frequency(cell, id)?;
            percentages |= percent || value > 1.0;
            row.push(value);
        }
        ids.push(id.to_string());
        rows.push(row);
    }

    if percentages {
        rows.iter_mut()
            .flat_map(|row| row.iter_mut())
            .for_each(|v| *v /= 100.0);
    }

    TrajectoryTable::new(ids, timepoints, rows)
}

pub fn read_trajectory_table<P: AsRef<Path>>(path: P) -> Result<TrajectoryTable> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    parse_trajectory_table(file, TableFormat::from_path(path))
}

/// Where every output table of one run goes.
#[derive(Debug, Clone)]
pub struct OutputFiles {
    pub format: TableFormat,
    pub folder: PathBuf,
    pub genotypes: PathBuf,
    pub trajectories: PathBuf,
    pub populations: PathBuf,
    pub edges: PathBuf,
    pub distance: PathBuf,
    pub members: PathBuf,
}

impl OutputFiles {
    /// Lay out (and create) the output folders for a run named `name`.
    pub fn create<P: AsRef<Path>>(folder: P, name: &str, format: TableFormat) -> Result<Self> {
        let folder = folder.as_ref().to_path_buf();
        let tables = folder.join("tables");
        let supplementary = folder.join("supplementary-files");
        fs::create_dir_all(&tables)?;
        fs::create_dir_all(&supplementary)?;

        let suffix = format.suffix();
        Ok(OutputFiles {
            format,
            genotypes: folder.join(format!("{name}.genotypes.{suffix}")),
            trajectories: tables.join(format!("{name}.trajectories.{suffix}")),
            populations: tables.join(format!("{name}.populations.{suffix}")),
            edges: tables.join(format!("{name}.edges.{suffix}")),
            distance: tables.join(format!("{name}.distance.{suffix}")),
            members: supplementary.join(format!("{name}.genotypemembers.{suffix}")),
            folder,
        })
    }

    fn writer(&self, path: &Path) -> Result<csv::Writer<fs::File>> {
        Ok(csv::WriterBuilder::new()
            .delimiter(self.format.delimiter())
            .from_path(path)?)
    }

    /// Write every table of an analysis result.
    pub fn write_all(&self, trajectories: &TrajectoryTable, result: &AnalysisResult) -> Result<()> {
        self.write_genotypes(result)?;
        self.write_trajectories(trajectories, result)?;
        self.write_populations(result)?;
        self.write_edges(result)?;
        self.write_distance(result)?;
        self.write_members(result)?;
        info!("Wrote result tables to {}", self.folder.display());
        Ok(())
    }

    fn write_genotypes(&self, result: &AnalysisResult) -> Result<()> {
        let sorted = result.sorted_genotypes();
        let members = genotype_member_table(sorted, result.genotypes());
        let mut wtr = self.writer(&self.genotypes)?;

        let mut header = vec!["Genotype".to_string()];
        header.extend((0..sorted.timepoints().len()).map(|t| sorted.timepoint_label(t)));
        header.push("members".to_string());
        wtr.write_record(&header)?;

        for ((name, row), (_, joined)) in sorted.iter().zip(&members) {
            let mut record = vec![name.to_string()];
            record.extend(row.iter().map(|v| v.to_string()));
            record.push(joined.clone());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_trajectories(&self, trajectories: &TrajectoryTable, result: &AnalysisResult) -> Result<()> {
        let mut wtr = self.writer(&self.trajectories)?;
        let mut header = vec!["Trajectory".to_string()];
        header.extend((0..trajectories.timepoints().len()).map(|t| trajectories.timepoint_label(t)));
        header.push("genotype".to_string());
        wtr.write_record(&header)?;

        for row in annotated_trajectory_table(trajectories, result.genotypes()) {
            let mut record = vec![row.id];
            record.extend(row.frequencies.iter().map(|v| v.to_string()));
            record.push(row.genotype);
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_populations(&self, result: &AnalysisResult) -> Result<()> {
        let mut wtr = self.writer(&self.populations)?;
        wtr.write_record(["Generation", "Identity", "Population"])?;
        for row in population_table(result) {
            wtr.write_record([
                row.generation.to_string(),
                row.identity,
                row.population.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_edges(&self, result: &AnalysisResult) -> Result<()> {
        let mut wtr = self.writer(&self.edges)?;
        wtr.write_record(["Parent", "Identity"])?;
        for edge in edge_table(result.lineage()) {
            wtr.write_record([edge.parent, edge.identity])?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_distance(&self, result: &AnalysisResult) -> Result<()> {
        let matrix = result.genotypes().pairwise();
        let mut wtr = self.writer(&self.distance)?;
        let mut header = vec![String::new()];
        header.extend(matrix.ids().iter().cloned());
        wtr.write_record(&header)?;
        for (i, id) in matrix.ids().iter().enumerate() {
            let mut record = vec![id.clone()];
            record.extend((0..matrix.len()).map(|j| matrix.get(i, j).to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_members(&self, result: &AnalysisResult) -> Result<()> {
        let mut wtr = self.writer(&self.members)?;
        wtr.write_record(["Genotype", "members"])?;
        for (name, joined) in genotype_member_table(result.sorted_genotypes(), result.genotypes()) {
            wtr.write_record([name, joined])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
