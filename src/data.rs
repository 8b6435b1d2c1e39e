pub mod boundary;
pub mod osm;
pub mod rings;

#[cfg(test)]
pub mod fixtures;
