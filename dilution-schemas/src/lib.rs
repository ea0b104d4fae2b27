pub mod dose_table;
pub mod file_formats;
pub mod level_matrix;
pub mod mixing;
pub mod records;
pub mod settings;
