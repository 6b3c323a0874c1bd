use std::{collections::HashMap, fs::File, io::BufWriter, path::PathBuf};

use csv::Writer;
use thiserror::Error;

pub type ResultWriter = Writer<BufWriter<File>>;

#[derive(Debug, Error)]
pub enum ResultErrors {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("no result writer with id {0}")]
    WriterNotFound(u32),
}

/// Owns one CSV writer per telemetry stream under a common result folder.
pub struct ResultManager {
    writers: HashMap<u32, ResultWriter>,
    pub result_path: PathBuf,
    next_id: u32,
}

impl ResultManager {
    pub fn new(result_path: PathBuf) -> Self {
        Self { writers: HashMap::new(), result_path, next_id: 0 }
    }

    /// Creates `<result_path>/<name>.csv`, writes the header row and returns
    /// the id used by [`ResultManager::write_record`].
    pub fn new_writer(&mut self, name: &str, headers: &[&str]) -> Result<u32, ResultErrors> {
        std::fs::create_dir_all(&self.result_path)?;

        let filename = name.to_string() + ".csv";
        let file = File::create(
            self.result_path
                .join(filename),
        )?;
        let mut writer = Writer::from_writer(BufWriter::new(file));
        writer.write_record(headers)?;

        let id = self.next_id;
        self.writers
            .insert(id, writer);
        self.next_id += 1;
        Ok(id)
    }

    pub fn write_record(&mut self, id: u32, content: &[String]) -> Result<(), ResultErrors> {
        let writer = self
            .writers
            .get_mut(&id)
            .ok_or(ResultErrors::WriterNotFound(id))?;
        writer.write_record(content)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ResultErrors> {
        for writer in self
            .writers
            .values_mut()
        {
            writer.flush()?;
        }
        Ok(())
    }

    pub fn writer_count(&self) -> usize {
        self.writers.len()
    }
}

pub trait AdcsResult {
    /// Registers the result stream(s) for this component
    fn new_result(&mut self, results: &mut ResultManager) -> Result<(), ResultErrors>;
    // Appends the current state as one record
    fn write_result(&self, results: &mut ResultManager) -> Result<(), ResultErrors>;
}
