pub mod report_handler;

pub use report_handler::{
    calendar_reports, create_report, delete_report, export_reports, get_report, list_reports,
    update_report,
};
