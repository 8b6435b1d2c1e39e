pub mod endpoint_index;
pub mod way_soup;
