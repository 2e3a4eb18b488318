fn main() -> anyhow::Result<()> {
    pacepod_lib::run()
}
