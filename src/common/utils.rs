//! Small helpers shared by the CLI, config and state modules.

use std::path::Path;

/// Render a path for display with the home directory replaced by `~`.
///
/// Keeps user names out of logs that people paste into bug reports.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        if stripped.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Round `value` to the nearest multiple of `step`, halves rounding up.
pub fn round_to_step(value: f64, step: u32) -> u32 {
    let step = f64::from(step.max(1));
    let rounded = ((value + step / 2.0) / step).floor() * step;
    rounded.max(0.0) as u32
}

/// Describe a whole number of hours the way the status output prints it.
pub fn humanize_hours(hours: u32) -> String {
    match hours {
        0 => "less than an hour".to_string(),
        1 => "1 hour".to_string(),
        n => format!("{n} hours"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_step() {
        assert_eq!(round_to_step(4349.0, 100), 4300);
        assert_eq!(round_to_step(4350.0, 100), 4400);
        assert_eq!(round_to_step(21.56, 5), 20);
        assert_eq!(round_to_step(22.5, 5), 25);
        assert_eq!(round_to_step(0.0, 5), 0);
    }

    #[test]
    fn test_humanize_hours() {
        assert_eq!(humanize_hours(0), "less than an hour");
        assert_eq!(humanize_hours(1), "1 hour");
        assert_eq!(humanize_hours(7), "7 hours");
    }

    #[test]
    fn test_private_path_hides_home() {
        if let Some(home) = dirs::home_dir()
            && home != Path::new("/")
        {
            let inside = home.join(".config").join("lightly");
            assert_eq!(private_path(&inside), "~/.config/lightly");
            assert_eq!(private_path(&home), "~");
        }
    }
}
