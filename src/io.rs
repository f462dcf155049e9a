//! Readers for the offline artifacts. Both formats are plain CSV:
//!
//! - similarity matrix: header `key,<k1>,<k2>,...`, one record per row key,
//!   row keys in the same order as the header keys;
//! - rating pivot: header `item,<u1>,<u2>,...`, one record per item, empty
//!   cells mean the user never interacted with the item.
//!
//! Keys are kept as raw strings. Numeric-looking identifiers are never
//! parsed, so two artifacts can only agree on a key by spelling it the same
//! way.

use std::fs::File;
use std::io::Read;

use anyhow::{bail, Context, Result};
use itertools::Itertools;
use rayon::prelude::*;

use crate::matrix::{EntityKey, RatingPivot, SimilarityMatrix};

pub fn read_similarity_matrix(path: &str) -> Result<SimilarityMatrix> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open similarity matrix file: {}", path))?;
    parse_similarity_matrix(file)
        .with_context(|| format!("Malformed similarity matrix file: {}", path))
}

pub fn read_rating_pivot(path: &str) -> Result<RatingPivot> {
    let file =
        File::open(path).with_context(|| format!("Cannot open rating pivot file: {}", path))?;
    parse_rating_pivot(file).with_context(|| format!("Malformed rating pivot file: {}", path))
}

fn header_keys<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<EntityKey>> {
    let headers = reader.headers()?;
    let keys: Vec<EntityKey> = headers.iter().skip(1).map(|key| key.to_string()).collect();
    if keys.is_empty() {
        bail!("header declares no entity keys");
    }
    if let Some(duplicate) = keys.iter().duplicates().next() {
        bail!("duplicate key `{}` in header", duplicate);
    }
    Ok(keys)
}

fn read_records<R: Read>(
    reader: &mut csv::Reader<R>,
    width: usize,
) -> Result<Vec<csv::StringRecord>> {
    let mut records = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != width + 1 {
            bail!(
                "row {} has {} fields, expected {}",
                row + 2,
                record.len(),
                width + 1
            );
        }
        records.push(record);
    }
    Ok(records)
}

fn parse_similarity_matrix<R: Read>(input: R) -> Result<SimilarityMatrix> {
    let mut reader = csv::Reader::from_reader(input);
    let keys = header_keys(&mut reader)?;
    let records = read_records(&mut reader, keys.len())?;

    let row_keys: Vec<EntityKey> = records
        .iter()
        .map(|record| record.get(0).unwrap_or_default().to_string())
        .collect();
    if row_keys != keys {
        bail!("row keys do not match header keys");
    }

    let rows: Vec<Vec<f64>> = records
        .par_iter()
        .enumerate()
        .map(|(row, record)| {
            record
                .iter()
                .skip(1)
                .map(|field| {
                    field.trim().parse::<f64>().with_context(|| {
                        format!("row {}: invalid similarity value `{}`", row + 2, field)
                    })
                })
                .collect()
        })
        .collect::<Result<_>>()?;

    let scores: Vec<f64> = rows.into_iter().flatten().collect();
    Ok(SimilarityMatrix::new(keys, scores)?)
}

fn parse_rating_pivot<R: Read>(input: R) -> Result<RatingPivot> {
    let mut reader = csv::Reader::from_reader(input);
    let user_keys = header_keys(&mut reader)?;
    let records = read_records(&mut reader, user_keys.len())?;

    let item_keys: Vec<EntityKey> = records
        .iter()
        .map(|record| record.get(0).unwrap_or_default().to_string())
        .collect();

    let rows: Vec<Vec<Option<f64>>> = records
        .par_iter()
        .enumerate()
        .map(|(row, record)| {
            record
                .iter()
                .skip(1)
                .map(|field| {
                    let field = field.trim();
                    if field.is_empty() {
                        Ok(None)
                    } else {
                        field.parse::<f64>().map(Some).with_context(|| {
                            format!("row {}: invalid rating value `{}`", row + 2, field)
                        })
                    }
                })
                .collect()
        })
        .collect::<Result<_>>()?;

    let scores: Vec<Option<f64>> = rows.into_iter().flatten().collect();
    Ok(RatingPivot::new(item_keys, user_keys, scores)?)
}
