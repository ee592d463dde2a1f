use anyhow::{Context, Result};
use selfit_core::content::builtin_lesson;
use selfit_core::script::Lesson;
use std::fs;
use std::path::Path;

/// Loads a lesson from `<dir>/lesson.json` when present, falling back to
/// the builtin Basic 01 Day 01 lesson otherwise.
pub fn load_lesson(dir_path: &Path) -> Result<Lesson> {
    let path = dir_path.join("lesson.json");
    if !path.is_file() {
        tracing::info!("No lesson.json in {}, using builtin lesson", dir_path.display());
        return Ok(builtin_lesson());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read lesson file: {}", path.display()))?;
    let lesson: Lesson = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse lesson file: {}", path.display()))?;

    Ok(lesson)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_missing_lesson_file_falls_back_to_builtin() -> Result<()> {
        let dir = tempdir()?;

        let lesson = load_lesson(dir.path())?;

        assert_eq!(lesson.course, builtin_lesson().course);
        Ok(())
    }

    #[test]
    fn test_lesson_json_overrides_the_builtin() -> Result<()> {
        let dir = tempdir()?;

        let mut custom = builtin_lesson();
        custom.course = "Basic 02 Day 03".to_string();
        let mut file = File::create(dir.path().join("lesson.json"))?;
        write!(file, "{}", serde_json::to_string(&custom)?)?;

        let lesson = load_lesson(dir.path())?;

        assert_eq!(lesson.course, "Basic 02 Day 03");
        assert_eq!(lesson.roleplay.len(), custom.roleplay.len());
        Ok(())
    }

    #[test]
    fn test_malformed_lesson_json_is_an_error() -> Result<()> {
        let dir = tempdir()?;

        let mut file = File::create(dir.path().join("lesson.json"))?;
        write!(file, "{{ not json")?;

        assert!(load_lesson(dir.path()).is_err());
        Ok(())
    }
}
