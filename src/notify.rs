pub fn send_completion(label: &str, minutes: i64, silent: bool) {
    if silent {
        return;
    }

    let mut notification = notify_rust::Notification::new();
    notification
        .summary(&format!("{label} complete"))
        .body(&format!("{minutes} min timer finished"))
        .appname("zaetomat");

    #[cfg(target_os = "macos")]
    notification.sound_name("Glass");

    if let Err(e) = notification.show() {
        eprintln!("Failed to send notification: {e}");
    }
}
