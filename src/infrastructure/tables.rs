// Infrastructure: CSV node/link tables and result files

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::application::mappers::{LinkRow, NodeRow};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read {table} table: {source}")]
    Read {
        table: &'static str,
        source: csv::Error,
    },

    #[error("{table} table has no '{column}' column")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("cannot write results: {0}")]
    Write(#[from] csv::Error),
}

/// Which columns the tables must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    Cvrp,
    Vrptw,
}

impl TableLayout {
    fn node_columns(self) -> &'static [&'static str] {
        match self {
            TableLayout::Cvrp => &["id", "demand"],
            TableLayout::Vrptw => &["id", "demand", "start_time", "end_time", "service_time"],
        }
    }

    fn link_columns(self) -> &'static [&'static str] {
        match self {
            TableLayout::Cvrp => &["from_node_id", "to_node_id", "link_cost"],
            TableLayout::Vrptw => &["from_node_id", "to_node_id", "link_cost", "travel_time"],
        }
    }
}

pub fn read_nodes<R: Read>(reader: R, layout: TableLayout) -> Result<Vec<NodeRow>, TableError> {
    read_rows(reader, "node", layout.node_columns())
}

pub fn read_links<R: Read>(reader: R, layout: TableLayout) -> Result<Vec<LinkRow>, TableError> {
    read_rows(reader, "link", layout.link_columns())
}

pub fn load_nodes(path: &Path, layout: TableLayout) -> Result<Vec<NodeRow>, TableError> {
    read_nodes(open(path)?, layout)
}

pub fn load_links(path: &Path, layout: TableLayout) -> Result<Vec<LinkRow>, TableError> {
    read_links(open(path)?, layout)
}

/// Writes rows with a header taken from the row type
pub fn write_rows<W, S>(writer: W, rows: impl IntoIterator<Item = S>) -> Result<(), TableError>
where
    W: Write,
    S: Serialize,
{
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn save_rows<S: Serialize>(
    path: &Path,
    rows: impl IntoIterator<Item = S>,
) -> Result<(), TableError> {
    let file = File::create(path).map_err(|source| TableError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    write_rows(file, rows)?;
    debug!(path = %path.display(), "results written");
    Ok(())
}

fn open(path: &Path) -> Result<File, TableError> {
    File::open(path).map_err(|source| TableError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn read_rows<R, T>(
    reader: R,
    table: &'static str,
    required: &[&'static str],
) -> Result<Vec<T>, TableError>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|source| TableError::Read { table, source })?;
    if let Some(column) = required
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        return Err(TableError::MissingColumn {
            table,
            column: *column,
        });
    }

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| TableError::Read { table, source })?;
    debug!(table, rows = rows.len(), "table loaded");
    Ok(rows)
}
