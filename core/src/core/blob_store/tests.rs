use super::*;
use std::io::Cursor;
use tempfile::tempdir;

fn create_test_store() -> (BlobStore, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let store = BlobStore {
        blobs_path: temp_dir.path().join("blobs"),
        max_file_bytes: 1024,
    };
    (store, temp_dir)
}

/// Reader that fails after yielding some bytes.
struct FailingReader {
    remaining: usize,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::other("connection reset"));
        }
        let n = self.remaining.min(buf.len());
        buf[..n].fill(b'x');
        self.remaining -= n;
        Ok(n)
    }
}

mod put {
    use super::*;

    #[test]
    fn test_put_writes_bytes_under_fresh_key() {
        let (store, _temp) = create_test_store();

        let (key, size) = store.put(&b"hello blob"[..]).unwrap();

        assert_eq!(size, 10);
        let path = store.path(&key).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"hello blob");
    }

    #[test]
    fn test_put_creates_blobs_directory() {
        let (store, _temp) = create_test_store();
        assert!(!store.blobs_path.exists());

        store.put(Cursor::new(vec![1, 2, 3])).unwrap();
        assert!(store.blobs_path.exists());
    }

    #[test]
    fn test_put_twice_yields_distinct_keys() {
        let (store, _temp) = create_test_store();

        let (a, _) = store.put(&b"same"[..]).unwrap();
        let (b, _) = store.put(&b"same"[..]).unwrap();

        assert_ne!(a, b);
        assert_eq!(store.list_keys().unwrap().len(), 2);
    }

    #[test]
    fn test_put_accepts_exact_limit() {
        let (store, _temp) = create_test_store();

        let (_, size) = store.put(Cursor::new(vec![0u8; 1024])).unwrap();
        assert_eq!(size, 1024);
    }

    #[test]
    fn test_put_rejects_oversized_source_and_cleans_up() {
        let (store, _temp) = create_test_store();

        let err = store.put(Cursor::new(vec![0u8; 1025])).unwrap_err();

        assert!(matches!(err, BlobStoreError::FileTooLarge { max: 1024 }));
        assert!(store.list_keys().unwrap().is_empty());
        assert!(store.list_partial_keys().unwrap().is_empty());
    }

    #[test]
    fn test_put_read_failure_leaves_nothing_behind() {
        let (store, _temp) = create_test_store();

        let err = store.put(FailingReader { remaining: 100 }).unwrap_err();

        assert!(matches!(err, BlobStoreError::Io(_)));
        assert_eq!(std::fs::read_dir(&store.blobs_path).unwrap().count(), 0);
    }

    #[test]
    fn test_put_empty_source() {
        let (store, _temp) = create_test_store();

        let (key, size) = store.put(io::empty()).unwrap();
        assert_eq!(size, 0);
        assert!(store.path(&key).is_ok());
    }
}

mod path {
    use super::*;

    #[test]
    fn test_path_unknown_key_is_not_found() {
        let (store, _temp) = create_test_store();
        let key = StorageKey::generate();

        let err = store.path(&key).unwrap_err();
        assert!(matches!(err, BlobStoreError::NotFound(k) if k == key));
    }

    #[test]
    fn test_blob_path_is_named_by_key() {
        let (store, _temp) = create_test_store();
        let key = StorageKey::generate();

        let path = store.blob_path(&key);
        assert_eq!(path.parent().unwrap(), store.blobs_path);
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), key.file_name());
    }
}

mod delete {
    use super::*;

    #[test]
    fn test_delete_removes_file() {
        let (store, _temp) = create_test_store();
        let (key, _) = store.put(&b"bytes"[..]).unwrap();

        store.delete(&key).unwrap();

        assert!(!store.blob_path(&key).exists());
        assert!(matches!(
            store.path(&key),
            Err(BlobStoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (store, _temp) = create_test_store();
        let (key, _) = store.put(&b"bytes"[..]).unwrap();

        store.delete(&key).unwrap();
        store.delete(&key).unwrap();
    }

    #[test]
    fn test_delete_unknown_key_without_directory() {
        let (store, _temp) = create_test_store();
        store.delete(&StorageKey::generate()).unwrap();
    }

    #[test]
    fn test_delete_partial_removes_part_file() {
        let (store, _temp) = create_test_store();
        std::fs::create_dir_all(&store.blobs_path).unwrap();
        let key = StorageKey::generate();
        let partial = store.blob_path(&key).with_extension("part");
        std::fs::write(&partial, b"half").unwrap();

        assert_eq!(store.list_partial_keys().unwrap(), vec![key]);
        store.delete_partial(&key).unwrap();
        assert!(!partial.exists());
        store.delete_partial(&key).unwrap();
    }
}

mod listing {
    use super::*;

    #[test]
    fn test_list_keys_without_directory_is_empty() {
        let (store, _temp) = create_test_store();
        assert!(store.list_keys().unwrap().is_empty());
        assert!(store.list_partial_keys().unwrap().is_empty());
    }

    #[test]
    fn test_list_keys_ignores_foreign_files() {
        let (store, _temp) = create_test_store();
        let (key, _) = store.put(&b"real"[..]).unwrap();
        std::fs::write(store.blobs_path.join("notes.txt"), b"x").unwrap();
        std::fs::write(store.blobs_path.join("README"), b"x").unwrap();
        std::fs::create_dir(store.blobs_path.join(StorageKey::generate().file_name())).unwrap();

        assert_eq!(store.list_keys().unwrap(), vec![key]);
    }

    #[test]
    fn test_modified_at_reports_missing_blob() {
        let (store, _temp) = create_test_store();
        let (key, _) = store.put(&b"x"[..]).unwrap();

        assert!(store.modified_at(&key).is_ok());
        store.delete(&key).unwrap();
        assert!(matches!(
            store.modified_at(&key),
            Err(BlobStoreError::NotFound(_))
        ));
    }
}
