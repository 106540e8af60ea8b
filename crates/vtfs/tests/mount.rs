mod common;

use std::thread;

use common::{dir_mode, file_mode, inode_of, mount};
use vfs::{
    File, FileSystemType, FsError, read_dir, vfs_create, vfs_lookup_at, vfs_mkdir,
    vfs_unlink, vfs_write,
};
use vtfs::{Vtfs, VtfsFsType};

#[test]
fn test_independent_mounts() {
    let first = mount("");
    let second = mount("");
    let root1 = first.root().unwrap();
    let root2 = second.root().unwrap();

    let a = vfs_create(&root1, "a", file_mode()).unwrap();
    assert!(vfs_lookup_at(&root2, "a").unwrap().is_negative());

    // 每次挂载从同一个编号开始分配
    let b = vfs_create(&root2, "b", file_mode()).unwrap();
    assert_eq!(inode_of(&a).ino(), inode_of(&b).ino());
    assert_eq!(inode_of(&root1).ino(), inode_of(&root2).ino());
}

#[test]
fn test_inode_numbers_are_not_reused() {
    let mount = mount("");
    let root = mount.root().unwrap();

    let first = inode_of(&vfs_create(&root, "a", file_mode()).unwrap()).ino();
    vfs_unlink(&root, "a").unwrap();
    let second = inode_of(&vfs_create(&root, "a", file_mode()).unwrap()).ino();
    let third = inode_of(&vfs_mkdir(&root, "d", dir_mode()).unwrap()).ino();
    assert!(first < second);
    assert!(second < third);
}

#[test]
fn test_mount_options() {
    let mount = mount("first_ino=1,root_mode=700,capacity=4");
    let root = mount.root().unwrap();
    let root_inode = inode_of(&root);
    assert_eq!(root_inode.ino(), 1);
    assert_eq!(root_inode.mode().bits(), 0o040700);

    let fs = mount.super_block().fs_info::<Vtfs>().unwrap();
    assert_eq!(fs.config().capacity, 4);
    assert_eq!(fs.next_ino(), 2);
    assert_eq!(fs.store().root_ino(), 1);

    let file = File::open(vfs_create(&root, "a", file_mode()).unwrap()).unwrap();
    assert_eq!(file.inode().ino(), 2);
    assert_eq!(vfs_write(&file, b"12345"), Err(FsError::FileTooLarge));
}

#[test]
fn test_bad_mount_options() {
    test_support::mock::vfs::init();
    let fs_type = VtfsFsType;
    for data in ["capacity=0", "first_ino=x", "colour=blue", "root_mode"] {
        assert_eq!(
            fs_type.mount(data).map(|_| ()),
            Err(FsError::InvalidArgument),
            "{data}"
        );
    }
}

#[test]
fn test_host_inode_exhaustion() {
    let mount = mount("max_inodes=2");
    let root = mount.root().unwrap();
    let sb = mount.super_block();

    let a = vfs_create(&root, "a", file_mode()).unwrap();
    assert_eq!(sb.nr_inodes(), 2);

    assert_eq!(
        vfs_create(&root, "b", file_mode()).map(|_| ()),
        Err(FsError::OutOfMemory)
    );
    assert_eq!(
        vfs_mkdir(&root, "c", dir_mode()).map(|_| ()),
        Err(FsError::OutOfMemory)
    );

    let fs = sb.fs_info::<Vtfs>().unwrap();
    assert_eq!(fs.store().len(), 1);
    let entries = read_dir(&File::open(root.clone()).unwrap()).unwrap();
    assert_eq!(common::names(&entries), vec![".", "..", "a"]);

    // 释放宿主 inode 后可以继续创建
    drop(a);
    assert_eq!(sb.nr_inodes(), 1);
    assert!(vfs_create(&root, "b", file_mode()).is_ok());
}

#[test]
fn test_failed_create_releases_host_inode() {
    let mount = mount("");
    let root = mount.root().unwrap();
    let sb = mount.super_block();

    let _a = vfs_create(&root, "a", file_mode()).unwrap();
    let live = sb.nr_inodes();
    assert_eq!(
        vfs_create(&root, "a", file_mode()).map(|_| ()),
        Err(FsError::AlreadyExists)
    );
    assert_eq!(sb.nr_inodes(), live);
}

#[test]
fn test_inode_numbers_run_out_without_wrapping() {
    let mount = mount("first_ino=18446744073709551613");
    let root = mount.root().unwrap();
    assert_eq!(inode_of(&root).ino(), usize::MAX - 2);

    let a = vfs_create(&root, "a", file_mode()).unwrap();
    assert_eq!(inode_of(&a).ino(), usize::MAX - 1);
    assert_eq!(
        vfs_create(&root, "b", file_mode()).map(|_| ()),
        Err(FsError::OutOfMemory)
    );
    assert_eq!(
        vfs_mkdir(&root, "c", dir_mode()).map(|_| ()),
        Err(FsError::OutOfMemory)
    );

    let entries = read_dir(&File::open(root.clone()).unwrap()).unwrap();
    assert_eq!(common::names(&entries), vec![".", "..", "a"]);
    assert_eq!(mount.super_block().nr_inodes(), 2);
}

#[test]
fn test_first_ino_without_room_rejected() {
    test_support::mock::vfs::init();
    for data in ["first_ino=18446744073709551615", "first_ino=18446744073709551614"] {
        assert_eq!(
            VtfsFsType.mount(data).map(|_| ()),
            Err(FsError::InvalidArgument),
            "{data}"
        );
    }
}

#[test]
fn test_rejected_create_checked_before_host_inode() {
    let mount = mount("max_inodes=1");
    let root = mount.root().unwrap();
    assert_eq!(
        vfs_create(&root, "", file_mode()).map(|_| ()),
        Err(FsError::InvalidArgument)
    );
    assert_eq!(
        vfs_mkdir(&root, "a/b", dir_mode()).map(|_| ()),
        Err(FsError::InvalidArgument)
    );
    // 宿主 inode 已用尽，合法名字才会走到分配
    assert_eq!(
        vfs_create(&root, "ok", file_mode()).map(|_| ()),
        Err(FsError::OutOfMemory)
    );
}

#[test]
fn test_rejected_create_consumes_no_inode_number() {
    let mount = mount("");
    let root = mount.root().unwrap();
    let fs = mount.super_block().fs_info::<Vtfs>().unwrap();

    vfs_create(&root, "a", file_mode()).unwrap();
    assert_eq!(fs.next_ino(), 102);
    for _ in 0..2 {
        assert_eq!(
            vfs_create(&root, "a", file_mode()).map(|_| ()),
            Err(FsError::AlreadyExists)
        );
    }
    assert_eq!(
        vfs_mkdir(&root, "..", dir_mode()).map(|_| ()),
        Err(FsError::InvalidArgument)
    );
    let a = vfs_lookup_at(&root, "a").unwrap();
    assert_eq!(
        vfs_create(&a, "x", file_mode()).map(|_| ()),
        Err(FsError::NotDirectory)
    );
    assert_eq!(fs.next_ino(), 102);

    let b = vfs_create(&root, "b", file_mode()).unwrap();
    assert_eq!(inode_of(&b).ino(), 102);
}

#[test]
fn test_root_cannot_be_removed() {
    let mount = mount("");
    let root = mount.root().unwrap();
    assert_eq!(vfs::vfs_rmdir(&root, "."), Err(FsError::NotFound));
    assert_eq!(vfs::vfs_rmdir(&root, ".."), Err(FsError::NotFound));
    assert_eq!(vfs_unlink(&root, "/"), Err(FsError::NotFound));
    assert!(!root.is_negative());
}

#[test]
fn test_umount_discards_state() {
    let mount = mount("");
    let root = mount.root().unwrap();
    let sb = mount.super_block().clone();
    let file = File::open(vfs_create(&root, "a", file_mode()).unwrap()).unwrap();

    mount.umount();
    assert!(sb.root().is_none());
    assert!(sb.fs_info::<Vtfs>().is_none());
    assert_eq!(vfs_write(&file, b"x"), Err(FsError::NoDevice));
    assert_eq!(vfs_lookup_at(&root, "a").map(|_| ()), Err(FsError::NoDevice));
}

#[test]
fn test_concurrent_creates() {
    let mount = mount("");
    let root = mount.root().unwrap();

    thread::scope(|s| {
        for t in 0..4 {
            let root = root.clone();
            s.spawn(move || {
                for i in 0..16 {
                    let name = format!("t{t}-{i}");
                    let d = vfs_create(&root, &name, file_mode()).unwrap();
                    let file = File::open(d).unwrap();
                    vfs_write(&file, name.as_bytes()).unwrap();
                }
            });
        }
    });

    let entries = read_dir(&File::open(root.clone()).unwrap()).unwrap();
    assert_eq!(entries.len(), 2 + 64);

    let mut inos: Vec<usize> = entries[2..].iter().map(|e| e.inode_no).collect();
    inos.sort_unstable();
    inos.dedup();
    assert_eq!(inos.len(), 64);

    let sample = vfs_lookup_at(&root, "t2-7").unwrap();
    let mut buf = [0u8; 8];
    let file = File::open(sample).unwrap();
    assert_eq!(vfs::vfs_read(&file, &mut buf), Ok(4));
    assert_eq!(&buf[..4], b"t2-7");
}

#[test]
fn test_fs_type_name() {
    assert_eq!(VtfsFsType.name(), "vtfs");
    assert_eq!(vtfs::VTFS_NAME, "vtfs");
}
