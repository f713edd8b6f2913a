//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# blink configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[engine]
# module_path = "C:/blink/blink.dll"   # unset: stage the embedded payload
# work_dir = "C:/Temp/blink"           # unset: <system temp>/blink
cookie_file = "cookie.dat"             # relative to work_dir

[core]
thread_name = "blink-ui"
# submit_timeout_ms = 30000    # 1-600000
# start_timeout_ms = 10000     # 1-600000
# shutdown_timeout_ms = 5000   # 1-600000
# event_capacity = 64          # 1-4096

[staging]
# prefix = "blink-"
# file_name = "blink.dll"
# stale_after_secs = 86400     # 60-2592000

[window]
title = "blink"
# width = 1280                 # 100-16384
# height = 800                 # 100-16384
# transparent = false
# url = "http://127.0.0.1:7569/web/index.html"

[devtools]
# enabled = false
# mount = "__devtools__"
# assets_dir = "devtools"

# [[filesystems]]
# mount = "app"
# root = "web"

[logging]
level = "INFO"                 # DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
