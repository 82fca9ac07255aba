fn main() -> anyhow::Result<()> {
    camera_app_lib::run()
}
