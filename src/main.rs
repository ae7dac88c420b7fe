fn main() -> anyhow::Result<()> {
    solace_journal::cli::run()
}
