use tabled::Tabled;

#[derive(Tabled)]
pub struct CheckRow {
    pub check: String,
    pub passed: u64,
    pub failed: u64,
    #[tabled(display = "percent")]
    pub pass_rate: f64,
}

fn percent(n: &f64) -> String {
    format!("{:.2}%", n * 100.0)
}
