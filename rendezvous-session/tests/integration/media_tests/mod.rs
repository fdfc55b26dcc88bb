mod test_remote_media_lifecycle;
