const COMMANDS: &[&str] = &["share", "can_share", "destinations", "set_style", "cleanup"];

fn main() {
  tauri_plugin::Builder::new(COMMANDS)
    .android_path("android")
    .ios_path("ios")
    .build();
}
