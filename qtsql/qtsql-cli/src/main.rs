mod cli;

fn main() -> color_eyre::eyre::Result<()> {
    cli::main()
}
