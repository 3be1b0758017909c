use crate::classes::{ClassCode, ClassScheme};
use crate::count::{count_of, ClassCount};
use crate::error::{Result, TransitionError};
use crate::transition::{TransitionMatrix, TransitionShares};
use log::info;
use std::io::{Read, Write};
use std::path::Path;

const CLASS_COLUMN: &str = "Class";
const FIRST_COUNT_COLUMN: &str = "First_Year_Pixel_Count";
const SECOND_COUNT_COLUMN: &str = "Second_Year_Pixel_Count";
const TO_CLASS_PREFIX: &str = "To_Class_";

/// One output row: a class, its counts in both snapshots, and where its
/// first-snapshot pixels went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub class: ClassCode,
    pub first_count: u64,
    pub second_count: u64,
    /// `to_class[t - 1]` = pixels that went from `class` to class `t`.
    ///
    /// Rows are source classes and columns destination classes. Older tables
    /// from the Python tooling were written the other way round, so readers
    /// that take columns as the source class must transpose.
    pub to_class: Vec<u64>,
}

/// Records for every class of the scheme, with the snapshot labels they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    pub first_label: String,
    pub second_label: String,
    pub records: Vec<TransitionRecord>,
}

impl TransitionTable {
    pub fn new(
        matrix: &TransitionMatrix,
        first_counts: &ClassCount,
        second_counts: &ClassCount,
        scheme: &ClassScheme,
        first_label: &str,
        second_label: &str,
    ) -> Self {
        let records = scheme
            .codes()
            .map(|class| TransitionRecord {
                class,
                first_count: count_of(first_counts, class),
                second_count: count_of(second_counts, class),
                to_class: scheme.codes().map(|to| matrix.get(to, class)).collect(),
            })
            .collect();

        Self {
            first_label: first_label.to_string(),
            second_label: second_label.to_string(),
            records,
        }
    }

    /// `Transitions_<first>_<second>.csv`
    pub fn file_name(&self) -> String {
        format!("Transitions_{}_{}.csv", self.first_label, self.second_label)
    }

    /// Rebuild the matrix the records were made from.
    pub fn to_matrix(&self) -> Result<TransitionMatrix> {
        let k = self.records.len();
        let mut matrix = TransitionMatrix::zeros(k);
        for (i, record) in self.records.iter().enumerate() {
            if record.class != i as ClassCode + 1 || record.to_class.len() != k {
                return Err(TransitionError::Config(format!(
                    "record {} does not fit a {}-class table",
                    i + 1,
                    k
                )));
            }
            for (t, &value) in record.to_class.iter().enumerate() {
                matrix.set(t as ClassCode + 1, record.class, value);
            }
        }
        Ok(matrix)
    }
}

fn header(k: usize) -> Vec<String> {
    let mut columns = vec![
        CLASS_COLUMN.to_string(),
        FIRST_COUNT_COLUMN.to_string(),
        SECOND_COUNT_COLUMN.to_string(),
    ];
    columns.extend((1..=k).map(|t| format!("{}{}", TO_CLASS_PREFIX, t)));
    columns
}

/// Write records as CSV to any writer.
pub fn write_records<W: Write>(writer: W, records: &[TransitionRecord]) -> Result<()> {
    let k = records.first().map(|r| r.to_class.len()).unwrap_or(0);
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header(k))?;

    for record in records {
        let mut row = Vec::with_capacity(3 + k);
        row.push(record.class.to_string());
        row.push(record.first_count.to_string());
        row.push(record.second_count.to_string());
        row.extend(record.to_class.iter().map(|v| v.to_string()));
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write a table to `dir/Transitions_<first>_<second>.csv`, returning the path.
pub fn write_table(dir: &Path, table: &TransitionTable) -> Result<std::path::PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(table.file_name());
    write_csv(&path, &table.records)?;
    Ok(path)
}

pub fn write_csv(path: &Path, records: &[TransitionRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_records(file, records)?;
    info!("Transition matrix exported to {}", path.display());
    Ok(())
}

/// Parse records written by [`write_records`].
pub fn read_records<R: Read>(reader: R) -> Result<Vec<TransitionRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    if headers.len() < 3
        || &headers[0] != CLASS_COLUMN
        || &headers[1] != FIRST_COUNT_COLUMN
        || &headers[2] != SECOND_COUNT_COLUMN
    {
        return Err(TransitionError::input(
            "transition table",
            "unexpected header",
        ));
    }

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let field = |i: usize| -> Result<u64> {
            row[i].trim().parse::<u64>().map_err(|e| {
                TransitionError::input(
                    "transition table",
                    format!("column {} ({}): {}", &headers[i], &row[i], e),
                )
            })
        };
        let class = row[0].trim().parse::<ClassCode>().map_err(|e| {
            TransitionError::input("transition table", format!("class id {}: {}", &row[0], e))
        })?;
        let to_class = (3..row.len()).map(&field).collect::<Result<Vec<u64>>>()?;
        records.push(TransitionRecord {
            class,
            first_count: field(1)?,
            second_count: field(2)?,
            to_class,
        });
    }
    Ok(records)
}

pub fn read_csv(path: &Path) -> Result<Vec<TransitionRecord>> {
    let file = std::fs::File::open(path)
        .map_err(|e| TransitionError::input(path.display().to_string(), e))?;
    read_records(file)
}

/// `Percentages_<first>_<second>.csv`
pub fn percentages_file_name(first_label: &str, second_label: &str) -> String {
    format!("Percentages_{}_{}.csv", first_label, second_label)
}

/// Write the percentage view: one row per retained source class, one
/// `To_Class_<t>` column per retained destination class.
pub fn write_shares<W: Write>(writer: W, rows: &[TransitionShares]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut columns = vec![CLASS_COLUMN.to_string()];
    if let Some(first) = rows.first() {
        columns.extend(
            first
                .shares
                .iter()
                .map(|(to, _)| format!("{}{}", TO_CLASS_PREFIX, to)),
        );
    }
    csv_writer.write_record(&columns)?;

    for row in rows {
        let mut record = Vec::with_capacity(1 + row.shares.len());
        record.push(row.from.to_string());
        record.extend(row.shares.iter().map(|(_, pct)| format!("{:.4}", pct)));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the percentage view to `dir/Percentages_<first>_<second>.csv`.
pub fn write_percentages(
    dir: &Path,
    first_label: &str,
    second_label: &str,
    rows: &[TransitionShares],
) -> Result<std::path::PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(percentages_file_name(first_label, second_label));
    let file = std::fs::File::create(&path)?;
    write_shares(file, rows)?;
    info!("Transition percentages exported to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::count_classes;
    use crate::transition::accumulate;
    use ndarray::arr2;

    fn scenario() -> (TransitionTable, TransitionMatrix) {
        let scheme = ClassScheme::numbered(3);
        let earlier = arr2(&[[1, 1], [2, 2]]);
        let later = arr2(&[[1, 2], [2, 2]]);
        let matrix = accumulate(&earlier, 255, &later, 255, &scheme).unwrap();
        let table = TransitionTable::new(
            &matrix,
            &count_classes(&earlier, 255),
            &count_classes(&later, 255),
            &scheme,
            "1990",
            "1995",
        );
        (table, matrix)
    }

    #[test]
    fn test_records_follow_class_enumeration() {
        let (table, _) = scenario();
        assert_eq!(table.records.len(), 3);
        let first = &table.records[0];
        assert_eq!(first.class, 1);
        assert_eq!(first.first_count, 2);
        assert_eq!(first.second_count, 1);
        assert_eq!(first.to_class, vec![1, 1, 0]);
        let second = &table.records[1];
        assert_eq!(second.first_count, 2);
        assert_eq!(second.second_count, 3);
        assert_eq!(second.to_class, vec![0, 2, 0]);
        // Class absent from both snapshots still gets a row.
        assert_eq!(table.records[2].to_class, vec![0, 0, 0]);
    }

    #[test]
    fn test_csv_layout() {
        let (table, _) = scenario();
        let mut buf = Vec::new();
        write_records(&mut buf, &table.records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Class,First_Year_Pixel_Count,Second_Year_Pixel_Count,To_Class_1,To_Class_2,To_Class_3")
        );
        assert_eq!(lines.next(), Some("1,2,1,1,1,0"));
        assert_eq!(lines.next(), Some("2,2,3,0,2,0"));
        assert_eq!(lines.next(), Some("3,0,0,0,0,0"));
    }

    #[test]
    fn test_round_trip_through_file() {
        let (table, matrix) = scenario();
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), &table).unwrap();
        assert!(path.ends_with("Transitions_1990_1995.csv"));

        let records = read_csv(&path).unwrap();
        assert_eq!(records, table.records);

        let rebuilt = TransitionTable {
            records,
            ..table.clone()
        };
        assert_eq!(rebuilt.to_matrix().unwrap(), matrix);
    }

    #[test]
    fn test_bad_header_is_rejected() {
        let text = "Id,A,B\n1,2,3\n";
        assert!(read_records(text.as_bytes()).is_err());
    }

    #[test]
    fn test_non_numeric_count_is_rejected() {
        let text = "Class,First_Year_Pixel_Count,Second_Year_Pixel_Count,To_Class_1\n1,x,0,0\n";
        assert!(read_records(text.as_bytes()).is_err());
    }

    #[test]
    fn test_percentages_leave_out_excluded_class() {
        let scheme = ClassScheme::numbered(3).with_excluded(vec![2]);
        let earlier = arr2(&[[1, 1, 1, 1], [2, 3, 3, 3]]);
        let later = arr2(&[[1, 1, 1, 2], [2, 3, 3, 1]]);
        let matrix = accumulate(&earlier, 255, &later, 255, &scheme).unwrap();
        let rows = matrix.row_percentages(&scheme).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_percentages(dir.path(), "1990", "1995", &rows).unwrap();
        assert!(path.ends_with("Percentages_1990_1995.csv"));

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Class,To_Class_1,To_Class_3"));
        // Class 1 keeps 3 of the 3 retained pixels, the 1 -> 2 pixel is dropped.
        assert_eq!(lines.next(), Some("1,100.0000,0.0000"));
        assert_eq!(lines.next(), Some("3,33.3333,66.6667"));
        assert_eq!(lines.next(), None);
    }
}
