//! Common utilities and helpers

pub mod logging;
pub mod path;
pub mod time;

/// Utility functions for SplitX
pub struct Utils;

impl Utils {
    /// Format file size for display
    pub fn format_file_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        format!("{:.1} {}", size, UNITS[unit_index])
    }

    /// Percentage of finished jobs, rounded to the nearest integer
    pub fn progress_percent(completed: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        ((completed as f64 / total as f64) * 100.0).round().min(100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(Utils::format_file_size(512), "512.0 B");
        assert_eq!(Utils::format_file_size(1536), "1.5 KB");
        assert_eq!(Utils::format_file_size(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn test_progress_percent_rounds() {
        assert_eq!(Utils::progress_percent(1, 3), 33);
        assert_eq!(Utils::progress_percent(2, 3), 67);
        assert_eq!(Utils::progress_percent(3, 3), 100);
        assert_eq!(Utils::progress_percent(0, 0), 0);
    }
}
