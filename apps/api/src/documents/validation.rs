//! Upload and submission input checks.

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
const MAX_FILENAME_LEN: usize = 255;
const MAX_JOB_TITLE_LEN: usize = 100;

pub fn validate_filename(filename: &str) -> Result<(), String> {
    if filename.trim().is_empty() {
        return Err("filename is required".to_string());
    }
    if filename.len() > MAX_FILENAME_LEN {
        return Err(format!(
            "filename too long (max {MAX_FILENAME_LEN} characters)"
        ));
    }
    let is_pdf = std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err("only PDF files are allowed".to_string());
    }
    Ok(())
}

pub fn validate_file_size(size: usize) -> Result<(), String> {
    if size == 0 {
        return Err("file is empty".to_string());
    }
    if size > MAX_FILE_SIZE {
        return Err("file size exceeds 10MB limit".to_string());
    }
    Ok(())
}

pub fn validate_content_type(content_type: Option<&str>) -> Result<(), String> {
    match content_type {
        Some("application/pdf") => Ok(()),
        Some(other) => Err(format!("invalid file type: {other}")),
        None => Err("missing file content type".to_string()),
    }
}

pub fn validate_job_title(job_title: &str) -> Result<(), String> {
    let job_title = job_title.trim();
    if job_title.is_empty() {
        return Err("job_title is required".to_string());
    }
    if job_title.chars().count() > MAX_JOB_TITLE_LEN {
        return Err(format!(
            "job_title cannot exceed {MAX_JOB_TITLE_LEN} characters"
        ));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c == '_';
    if !job_title.chars().all(allowed) {
        return Err("job_title contains invalid characters".to_string());
    }
    Ok(())
}
