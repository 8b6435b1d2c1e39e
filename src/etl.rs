pub mod boundary_rings;

use std::path::Path;
use log::{info, error};

use crate::errors::Result;


pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn is_cached(&self, dir: &Path) -> Result<bool>;
    fn clean(&self, dir: &Path) -> Result<()>;

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    fn process(&mut self, dir: &Path) -> Result<()> {
        info!(etl_name = self.etl_name(); "Starting ETL process");
        if self.is_cached(dir)? {
            info!(etl_name = self.etl_name(); "Using cached value");
        } else {
            info!(etl_name = self.etl_name(); "Extracting");
            let input = self.extract(dir);
            let input = log_failure(self.etl_name(), "Extraction", input)?;

            info!(etl_name = self.etl_name(); "Transforming");
            let output = self.transform(input);
            let output = log_failure(self.etl_name(), "Transformation", output)?;

            info!(etl_name = self.etl_name(); "Loading");
            let loaded = self.load(dir, output);
            log_failure(self.etl_name(), "Loading", loaded)?;
        }
        info!(etl_name = self.etl_name(); "Process finished");
        Ok(())
    }
}

fn log_failure<T>(etl_name: &str, stage: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        error!(etl_name = etl_name, stage = stage, err = err.to_string().as_str(); "ETL stage failed with error");
    }
    result
}
