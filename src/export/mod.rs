mod csv_export;

pub(crate) use csv_export::{default_file_name, export_month_to_path};
