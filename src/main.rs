fn main() -> anyhow::Result<()> {
    todomate::cli::run()
}
