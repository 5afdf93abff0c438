#![allow(dead_code)]

use sftp_tree::mem::MemoryFs;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `/root` holding directory `a` with file `f1`, and file `b`
pub fn small_tree() -> MemoryFs {
    init_logger();

    let fs = MemoryFs::new();
    fs.add_dir("/root").unwrap();
    fs.add_dir("/root/a").unwrap();
    fs.add_file("/root/a/f1", b"f1 contents").unwrap();
    fs.add_file("/root/b", b"b contents").unwrap();
    fs.clear_calls();
    fs
}

/// Several levels with mixed files and empty directories under `/srv/www`
pub fn deep_tree() -> MemoryFs {
    init_logger();

    let fs = MemoryFs::new();
    for dir in [
        "/srv",
        "/srv/www",
        "/srv/www/assets",
        "/srv/www/assets/img",
        "/srv/www/assets/img/icons",
        "/srv/www/empty",
        "/srv/www/logs",
    ] {
        fs.add_dir(dir).unwrap();
    }
    for file in [
        "/srv/www/index.html",
        "/srv/www/assets/app.js",
        "/srv/www/assets/img/logo.png",
        "/srv/www/assets/img/icons/a.svg",
        "/srv/www/assets/img/icons/b.svg",
        "/srv/www/logs/access.log",
    ] {
        fs.add_file(file, file.as_bytes()).unwrap();
    }
    fs.clear_calls();
    fs
}
